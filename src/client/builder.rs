use crate::client::core::RpcClient;
use crate::config::ClientConfig;
use crate::resilience::{retryer, Backoff, BoundedRetryer, Retryer};
use crate::signer::{Hmac256Signer, Signer};
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tracing::debug;

/// Builder for [`RpcClient`].
///
/// Anything left unset is derived from the configuration at build time:
/// exponential-jitter retries sized by `retry_max`, and HMAC-SHA256 signing.
#[derive(Default)]
pub struct RpcClientBuilder {
    config: Option<ClientConfig>,
    retryer: Option<Arc<dyn Retryer>>,
    signer: Option<Arc<dyn Signer>>,
    backoff: Option<Arc<dyn Backoff>>,
}

impl RpcClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration. Defaults to `ClientConfig::default()` plus
    /// `SIGNED_RPC_*` environment overrides.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the retry gate entirely. Takes precedence over [`Self::backoff`].
    pub fn retryer(mut self, retryer: impl Retryer + 'static) -> Self {
        self.retryer = Some(Arc::new(retryer));
        self
    }

    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Keep the configured attempt limit but pause with this strategy.
    pub fn backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    pub fn build(self) -> Result<RpcClient> {
        let config = match self.config {
            Some(config) => config,
            None => ClientConfig::default().with_env_overrides(),
        };
        config.validate()?;

        let endpoint = url::Url::parse(&config.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_source("client_builder"),
            )
        })?;

        let transport = Arc::new(HttpTransport::new(&config)?);

        let backoff_config = config.backoff_config();
        let retryer = match (self.retryer, self.backoff) {
            (Some(retryer), _) => retryer,
            (None, Some(backoff)) if backoff_config.max_attempts > 0 => Arc::new(
                BoundedRetryer::with_backoff(backoff_config.max_attempts, backoff),
            ),
            _ => retryer::from_config(&backoff_config),
        };

        let signer = self.signer.unwrap_or_else(|| Arc::new(Hmac256Signer));

        debug!(
            endpoint = %endpoint,
            retryer = ?retryer,
            timeout_secs = config.timeout_secs,
            "rpc client ready"
        );

        Ok(RpcClient {
            config,
            endpoint,
            transport,
            retryer,
            signer,
        })
    }
}
