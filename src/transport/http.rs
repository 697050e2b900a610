use crate::config::ClientConfig;
use crate::context::CallContext;
use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};
use arc_swap::ArcSwap;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, Proxy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Upper bound on how much of a discarded response body is read back.
pub(crate) const DRAIN_LIMIT: usize = 4096;

#[derive(Debug, Clone)]
struct TransportSettings {
    timeout: Duration,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    max_redirects: usize,
    proxy_url: Option<String>,
}

/// A fully prepared request whose body can be replayed on every attempt.
#[derive(Debug, Clone)]
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Pooled HTTP transport.
///
/// The `reqwest::Client` lives behind an `ArcSwap` so idle connections can be
/// evicted by swapping in a fresh pool; requests already in flight keep the
/// client they started with.
pub struct HttpTransport {
    client: ArcSwap<reqwest::Client>,
    settings: TransportSettings,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let settings = TransportSettings {
            timeout: Duration::from_secs(config.timeout_secs),
            pool_max_idle_per_host: config.pool_max_idle_per_host,
            pool_idle_timeout: Duration::from_secs(90),
            max_redirects: config.max_redirects,
            proxy_url: config.proxy_url.clone(),
        };
        let client = Self::build_client(&settings)?;
        Ok(Self {
            client: ArcSwap::from_pointee(client),
            settings,
        })
    }

    fn build_client(settings: &TransportSettings) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(settings.timeout)
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .pool_idle_timeout(Some(settings.pool_idle_timeout))
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects));

        if let Some(proxy_url) = &settings.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid proxy URL: {}", e),
                    ErrorContext::new()
                        .with_field_path("proxy_url")
                        .with_source("http_transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(|e| {
            Error::configuration_with_context(
                format!("failed to build HTTP client: {}", e),
                ErrorContext::new().with_source("http_transport"),
            )
        })
    }

    pub fn max_redirects(&self) -> usize {
        self.settings.max_redirects
    }

    /// Run one HTTP exchange. The body is re-framed from the retained bytes.
    pub(crate) async fn execute(
        &self,
        request: &PreparedRequest,
    ) -> std::result::Result<reqwest::Response, TransportError> {
        let client = self.client.load_full();
        client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| {
                TransportError::from_reqwest(
                    &request.method,
                    &request.url,
                    self.settings.max_redirects,
                    e,
                )
            })
    }

    /// Drop the current pool so its idle connections close.
    pub fn close_idle_connections(&self) {
        match Self::build_client(&self.settings) {
            Ok(fresh) => {
                self.client.store(Arc::new(fresh));
            }
            Err(e) => {
                warn!(error = %e, "unable to rebuild HTTP client; idle connections kept");
            }
        }
    }
}

/// Read and discard at most [`DRAIN_LIMIT`] bytes so the connection can be reused.
///
/// Stops early when `ctx` is done; a stalled body never outlives the call.
pub(crate) async fn drain_body(ctx: &CallContext, mut response: reqwest::Response) {
    let drain = async {
        let mut drained = 0usize;
        while drained < DRAIN_LIMIT {
            match response.chunk().await {
                Ok(Some(chunk)) => drained += chunk.len(),
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "error reading response body");
                    break;
                }
            }
        }
    };

    tokio::select! {
        biased;
        _ = ctx.done() => debug!("call finished while draining response body"),
        _ = drain => {}
    }
}
