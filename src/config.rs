//! Client configuration.
//!
//! Values come from code, a YAML file, or `SIGNED_RPC_*` environment
//! variables. Environment values override file values; malformed numbers are
//! ignored with a warning so a bad variable never masks a working file.

use crate::resilience::BackoffConfig;
use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.client.ch/v3";

const ENV_PREFIX: &str = "SIGNED_RPC_";

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    public_key: String,
    secret: String,
    pub base_url: String,
    /// Maximum number of attempts per call. `0` disables retries entirely.
    pub retry_max: u32,
    pub retry_wait_min_ms: u64,
    pub retry_wait_max_ms: u64,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub pool_max_idle_per_host: usize,
    pub proxy_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            secret: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_max: 0,
            retry_wait_min_ms: 1_000,
            retry_wait_max_ms: 30_000,
            timeout_secs: 60,
            max_redirects: 10,
            pool_max_idle_per_host: 32,
            proxy_url: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("public_key", &self.public_key)
            .field("secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("retry_max", &self.retry_max)
            .field("retry_wait_min_ms", &self.retry_wait_min_ms)
            .field("retry_wait_max_ms", &self.retry_wait_max_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_redirects", &self.max_redirects)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("proxy_url", &self.proxy_url)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(public_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret: secret.into(),
            ..Self::default()
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry_max: u32, wait_min: Duration, wait_max: Duration) -> Self {
        self.retry_max = retry_max;
        self.retry_wait_min_ms = wait_min.as_millis() as u64;
        self.retry_wait_max_ms = wait_max.as_millis() as u64;
        self
    }

    /// Load from the process environment only.
    pub fn from_env() -> Result<Self> {
        let config = Self::default().with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid YAML: {}", e),
                ErrorContext::new().with_source("config_yaml"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Apply `SIGNED_RPC_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (keys carry the `SIGNED_RPC_` prefix).
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("PUBLIC_KEY") {
            self.public_key = v;
        }
        if let Some(v) = get("SECRET") {
            self.secret = v;
        }
        if let Some(v) = get("BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = get("PROXY_URL") {
            self.proxy_url = Some(v);
        }
        override_parsed(&mut self.retry_max, "RETRY_MAX", get("RETRY_MAX"));
        override_parsed(
            &mut self.retry_wait_min_ms,
            "RETRY_WAIT_MIN_MS",
            get("RETRY_WAIT_MIN_MS"),
        );
        override_parsed(
            &mut self.retry_wait_max_ms,
            "RETRY_WAIT_MAX_MS",
            get("RETRY_WAIT_MAX_MS"),
        );
        override_parsed(&mut self.timeout_secs, "TIMEOUT_SECS", get("TIMEOUT_SECS"));
        override_parsed(&mut self.max_redirects, "MAX_REDIRECTS", get("MAX_REDIRECTS"));
        override_parsed(
            &mut self.pool_max_idle_per_host,
            "POOL_MAX_IDLE_PER_HOST",
            get("POOL_MAX_IDLE_PER_HOST"),
        );
        self
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone())
                    .with_source("config_validate"),
            )
        })?;

        if self.retry_max > 0 && self.retry_wait_min_ms > self.retry_wait_max_ms {
            return Err(Error::configuration_with_context(
                "retry_wait_min_ms must not exceed retry_wait_max_ms",
                ErrorContext::new()
                    .with_field_path("retry_wait_min_ms")
                    .with_details(format!(
                        "min={} max={}",
                        self.retry_wait_min_ms, self.retry_wait_max_ms
                    ))
                    .with_source("config_validate"),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "timeout_secs must be positive",
                ErrorContext::new()
                    .with_field_path("timeout_secs")
                    .with_source("config_validate"),
            ));
        }

        Ok(())
    }

    pub fn backoff_config(&self) -> BackoffConfig {
        BackoffConfig {
            min_delay: Duration::from_millis(self.retry_wait_min_ms),
            max_delay: Duration::from_millis(self.retry_wait_max_ms),
            max_attempts: self.retry_max,
        }
    }
}

fn override_parsed<T: FromStr>(slot: &mut T, name: &str, raw: Option<String>) {
    if let Some(raw) = raw {
        match raw.parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => warn!(
                variable = %format!("{}{}", ENV_PREFIX, name),
                value = raw.as_str(),
                "ignoring malformed configuration value"
            ),
        }
    }
}
