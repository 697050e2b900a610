use crate::config::ClientConfig;
use crate::context::CallContext;
use crate::protocol::{RpcRequest, DEFAULT_REQUEST_ID};
use crate::resilience::Retryer;
use crate::signer::Signer;
use crate::transport::http::PreparedRequest;
use crate::transport::HttpTransport;
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Client for a signed JSON-RPC endpoint.
///
/// Cheap to share behind an `Arc`; concurrent calls share only configuration
/// and the connection pool.
pub struct RpcClient {
    pub(crate) config: ClientConfig,
    pub(crate) endpoint: Url,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) retryer: Arc<dyn Retryer>,
    pub(crate) signer: Arc<dyn Signer>,
}

impl RpcClient {
    /// Build a client with the default retryer and signer for `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> crate::client::builder::RpcClientBuilder {
        crate::client::builder::RpcClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retryer(&self) -> &dyn Retryer {
        self.retryer.as_ref()
    }

    /// Close pooled connections that are not serving a request.
    pub fn close_idle_connections(&self) {
        self.transport.close_idle_connections();
    }

    /// Call `method` with `params` and decode the result.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.call_with_context(&CallContext::new(), method, params)
            .await
    }

    /// Same as [`RpcClient::call`], bounded by a cancellation scope.
    pub async fn call_with_context<P, R>(
        &self,
        ctx: &CallContext,
        method: &str,
        params: &P,
    ) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let body = RpcRequest::new(method, params, DEFAULT_REQUEST_ID).to_vec()?;
        debug!(body = %String::from_utf8_lossy(&body), "request body");

        // Signed once; every attempt replays the same credential.
        let signature = self
            .signer
            .sign(self.config.public_key(), self.config.secret(), &body)?;

        let request = PreparedRequest {
            method: Method::POST,
            url: self.endpoint.clone(),
            headers: Self::headers(&signature)?,
            body: Bytes::from(body),
        };
        self.send(ctx, &request).await
    }

    fn headers(signature: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        let authorization = HeaderValue::from_str(&format!("Basic {}", signature))
            .map_err(|e| Error::signing(format!("signature is not a valid header value: {}", e)))?;
        headers.insert(AUTHORIZATION, authorization);
        Ok(headers)
    }
}
