//! Retry and backoff primitives for the send loop.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`policy`] | Classifies one attempt's outcome as success, retryable or fatal |
//! | [`retryer`] | Attempt-limit gate combining classification and backoff |
//! | [`backoff`] | Delay strategies: constant, linear jitter, exponential jitter |
//!
//! Everything here is immutable configuration. A single [`Retryer`] is shared
//! by all concurrent calls of a client; jitter draws from the calling thread's
//! generator, so concurrent calls never share a random source.
//!
//! ```rust
//! use signed_rpc::resilience::{BoundedRetryer, Retryer, Outcome};
//! use signed_rpc::transport::ResponseHead;
//! use signed_rpc::CallContext;
//! use std::time::Duration;
//!
//! let retryer = BoundedRetryer::constant(3, Duration::from_millis(100));
//! let head = ResponseHead::new(503);
//! let decision = retryer.check_retry(&CallContext::new(), Outcome::from_response(&head), 1);
//! assert!(decision.retry);
//! assert_eq!(retryer.backoff(1, Some(&head)), Duration::from_millis(100));
//! ```

pub mod backoff;
pub mod policy;
pub mod retryer;

pub use backoff::{
    retry_after, Backoff, BackoffConfig, ConstantBackoff, ExponentialJitterBackoff,
    LinearJitterBackoff,
};
pub use policy::{classify, is_permanent_transport_error, is_retryable_status};
pub use retryer::{BoundedRetryer, NopRetryer, Retryer};

use crate::transport::{ResponseHead, TransportError};
use crate::Error;

/// What one attempt produced. Exactly one side is expected to be populated;
/// an empty outcome is treated as "no response received" (status 0).
#[derive(Debug, Clone, Copy, Default)]
pub struct Outcome<'a> {
    pub response: Option<&'a ResponseHead>,
    pub error: Option<&'a TransportError>,
}

impl<'a> Outcome<'a> {
    pub fn from_response(response: &'a ResponseHead) -> Self {
        Self {
            response: Some(response),
            error: None,
        }
    }

    pub fn from_error(error: &'a TransportError) -> Self {
        Self {
            response: None,
            error: Some(error),
        }
    }
}

/// Result of classifying an attempt: whether to go again, and the normalized error.
#[derive(Debug)]
pub struct RetryDecision {
    pub retry: bool,
    pub error: Option<Error>,
}

impl RetryDecision {
    pub fn retry(error: Option<Error>) -> Self {
        Self { retry: true, error }
    }

    pub fn stop(error: Option<Error>) -> Self {
        Self {
            retry: false,
            error,
        }
    }

    /// Stopped without any error: the attempt succeeded.
    pub fn is_success(&self) -> bool {
        !self.retry && self.error.is_none()
    }
}
