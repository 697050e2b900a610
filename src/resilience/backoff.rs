//! Delay strategies between attempts.
//!
//! Every strategy honours a server-provided `Retry-After` (whole seconds) on a
//! `429 Too Many Requests` response before falling back to its own formula.

use crate::transport::ResponseHead;
use std::fmt;
use std::time::Duration;

/// Retry window derived from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Maximum attempts per call; `0` means never retry.
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 0,
        }
    }
}

/// Computes the pause before the next attempt.
///
/// `attempt` is the 1-based number of the attempt that just failed.
pub trait Backoff: Send + Sync + fmt::Debug {
    fn delay(&self, attempt: u32, response: Option<&ResponseHead>) -> Duration;
}

/// `Retry-After` seconds from a 429 response, if present and a non-negative integer.
pub fn retry_after(response: Option<&ResponseHead>) -> Option<Duration> {
    let response = response?;
    if response.status() != 429 {
        return None;
    }
    response
        .header("Retry-After")?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

// Scale by a factor in [0, 1) without panicking on extreme durations.
fn scale(d: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(d.as_secs_f64() * factor)
        .map(|scaled| scaled.min(d))
        .unwrap_or(d)
}

/// Same pause every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    pub delay: Duration,
}

impl ConstantBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for ConstantBackoff {
    fn delay(&self, _attempt: u32, response: Option<&ResponseHead>) -> Duration {
        retry_after(response).unwrap_or(self.delay)
    }
}

/// Uniform jitter in `[min, max)` scaled linearly by the attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearJitterBackoff {
    pub min: Duration,
    pub max: Duration,
}

impl LinearJitterBackoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }
}

impl Backoff for LinearJitterBackoff {
    fn delay(&self, attempt: u32, response: Option<&ResponseHead>) -> Duration {
        if let Some(wait) = retry_after(response) {
            return wait;
        }

        let span = self.max.saturating_sub(self.min);
        let base = if span.is_zero() {
            self.min
        } else {
            self.min.saturating_add(scale(span, rand::random::<f64>()))
        };
        base.saturating_mul(attempt)
    }
}

/// Exponentially growing window capped at `max`, sampled uniformly above `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialJitterBackoff {
    pub min: Duration,
    pub max: Duration,
}

impl ExponentialJitterBackoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Upper bound of the sampling window for an attempt.
    fn ceiling(&self, attempt: u32) -> Duration {
        let grown = 1u32
            .checked_shl(attempt)
            .and_then(|factor| self.min.checked_mul(attempt)?.checked_mul(factor))
            .unwrap_or(Duration::MAX);
        let capped = grown.min(self.max);
        if self.min > capped {
            self.max
        } else {
            capped
        }
    }
}

impl From<&BackoffConfig> for ExponentialJitterBackoff {
    fn from(config: &BackoffConfig) -> Self {
        Self::new(config.min_delay, config.max_delay)
    }
}

impl Backoff for ExponentialJitterBackoff {
    fn delay(&self, attempt: u32, response: Option<&ResponseHead>) -> Duration {
        if let Some(wait) = retry_after(response) {
            return wait;
        }

        let span = self.ceiling(attempt).saturating_sub(self.min);
        if span.is_zero() {
            return self.min;
        }
        self.min.saturating_add(scale(span, rand::random::<f64>()))
    }
}
