//! # signed-rpc
//!
//! Client core for a signed JSON-RPC 2.0 API over HTTP.
//!
//! ## Overview
//!
//! Every call serializes a `{jsonrpc, method, params, id}` envelope, signs the
//! body once with the configured [`signer::Signer`], and sends it as a `POST`
//! to the configured endpoint. Failed attempts are classified as transient or
//! permanent; transient ones are retried up to a bounded number of attempts
//! with jittered, `Retry-After`-aware backoff. Every wait and exchange can be
//! cut short by a [`CallContext`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signed_rpc::{ClientConfig, RpcClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> signed_rpc::Result<()> {
//!     let config = ClientConfig::new("public-key", "secret")
//!         .with_retry(3, Duration::from_millis(500), Duration::from_secs(5));
//!     let client = RpcClient::new(config)?;
//!
//!     let balance: serde_json::Value = client
//!         .call("account.balance", &serde_json::json!({"currency": "CHF"}))
//!         .await?;
//!     println!("{}", balance);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder and the retrying send loop |
//! | [`resilience`] | Outcome classification, retry gate, backoff strategies |
//! | [`transport`] | Pooled HTTP transport, response heads, transport errors |
//! | [`protocol`] | JSON-RPC envelope codec |
//! | [`signer`] | Request signing |
//! | [`config`] | Configuration from code, YAML or environment |
//! | [`context`] | Per-call cancellation and deadlines |

pub mod client;
pub mod config;
pub mod context;
pub mod protocol;
pub mod resilience;
pub mod signer;
pub mod transport;

// Re-export main types for convenience
pub use client::{RpcClient, RpcClientBuilder};
pub use config::ClientConfig;
pub use context::CallContext;
pub use resilience::{
    BoundedRetryer, ConstantBackoff, ExponentialJitterBackoff, LinearJitterBackoff, NopRetryer,
    Retryer,
};
pub use signer::{Hmac256Signer, Signer};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
