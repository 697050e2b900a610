//! Outcome classification.

use super::{Outcome, RetryDecision};
use crate::transport::{TransportError, TransportErrorKind};
use crate::Error;
use once_cell::sync::Lazy;
use regex::Regex;

static TOO_MANY_REDIRECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"stopped after \d+ redirects\z").expect("valid regex"));

static UNSUPPORTED_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"unsupported protocol scheme").expect("valid regex"));

/// Status codes worth another attempt: 0 (nothing received) and 5xx except 501.
pub fn is_retryable_status(status: u16) -> bool {
    status == 0 || ((500..=599).contains(&status) && status != 501)
}

/// Transport failures caused by misconfiguration; retrying cannot fix them.
pub fn is_permanent_transport_error(err: &TransportError) -> bool {
    match err.kind() {
        TransportErrorKind::UnknownAuthority | TransportErrorKind::Cancelled => true,
        _ => {
            TOO_MANY_REDIRECTS.is_match(err.message())
                || UNSUPPORTED_SCHEME.is_match(err.message())
        }
    }
}

/// Classify one attempt.
///
/// Transport errors are returned verbatim; HTTP statuses outside 2xx become
/// `unexpected HTTP status: <status line>`.
pub fn classify(outcome: &Outcome<'_>) -> RetryDecision {
    if let Some(err) = outcome.error {
        let error = Some(Error::Transport(err.clone()));
        return if is_permanent_transport_error(err) {
            RetryDecision::stop(error)
        } else {
            RetryDecision::retry(error)
        };
    }

    let status = outcome.response.map(|r| r.status()).unwrap_or(0);

    if is_retryable_status(status) {
        return RetryDecision::retry(Some(Error::unexpected_status(status)));
    }

    if !(200..=299).contains(&status) {
        return RetryDecision::stop(Some(Error::unexpected_status(status)));
    }

    RetryDecision::stop(None)
}
