//! Attempt-limit gate used by the send loop.

use super::backoff::{Backoff, BackoffConfig, ConstantBackoff, ExponentialJitterBackoff};
use super::{classify, Outcome, RetryDecision};
use crate::context::CallContext;
use crate::transport::ResponseHead;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a failed attempt is tried again and how long to wait first.
///
/// Implementations must be safe to share across concurrent calls.
pub trait Retryer: Send + Sync + fmt::Debug {
    /// Judge the attempt numbered `attempt` (1-based).
    ///
    /// A done context always wins: the decision is then "stop" carrying the
    /// context's error, regardless of what the attempt produced.
    fn check_retry(&self, ctx: &CallContext, outcome: Outcome<'_>, attempt: u32) -> RetryDecision;

    /// Pause before the attempt after `attempt`.
    fn backoff(&self, attempt: u32, response: Option<&ResponseHead>) -> Duration;
}

/// Never retries; still classifies so failures surface as errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopRetryer;

impl Retryer for NopRetryer {
    fn check_retry(&self, ctx: &CallContext, outcome: Outcome<'_>, _attempt: u32) -> RetryDecision {
        if let Some(err) = ctx.err() {
            return RetryDecision::stop(Some(err));
        }
        RetryDecision::stop(classify(&outcome).error)
    }

    fn backoff(&self, _attempt: u32, _response: Option<&ResponseHead>) -> Duration {
        Duration::ZERO
    }
}

/// Retries classified-transient failures until `max_attempts` attempts were made.
#[derive(Debug, Clone)]
pub struct BoundedRetryer {
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
}

impl BoundedRetryer {
    pub fn new(max_attempts: u32, backoff: impl Backoff + 'static) -> Self {
        Self {
            max_attempts,
            backoff: Arc::new(backoff),
        }
    }

    /// Share an already boxed strategy, e.g. one chosen at runtime.
    pub fn with_backoff(max_attempts: u32, backoff: Arc<dyn Backoff>) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    pub fn constant(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, ConstantBackoff::new(delay))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Retryer for BoundedRetryer {
    fn check_retry(&self, ctx: &CallContext, outcome: Outcome<'_>, attempt: u32) -> RetryDecision {
        if let Some(err) = ctx.err() {
            return RetryDecision::stop(Some(err));
        }

        let decision = classify(&outcome);
        if attempt >= self.max_attempts {
            return RetryDecision::stop(decision.error);
        }
        decision
    }

    fn backoff(&self, attempt: u32, response: Option<&ResponseHead>) -> Duration {
        self.backoff.delay(attempt, response)
    }
}

/// Retryer for a configured window: exponential jitter, or none when `max_attempts` is 0.
pub fn from_config(config: &BackoffConfig) -> Arc<dyn Retryer> {
    if config.max_attempts == 0 {
        Arc::new(NopRetryer)
    } else {
        Arc::new(BoundedRetryer::new(
            config.max_attempts,
            ExponentialJitterBackoff::from(config),
        ))
    }
}
