use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for configuration problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key that caused the error (e.g., "base_url", "retry_wait_min_ms")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_env", "config_validate")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for a signed JSON-RPC call.
///
/// Display strings are part of the contract: transport errors and JSON decode
/// errors are rendered verbatim so callers see the underlying cause.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("unexpected HTTP status: {status_line}")]
    UnexpectedStatus { status: u16, status_line: String },

    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("{message} ({code})")]
    Rpc { code: i64, message: String },

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("request signing failed: {message}")]
    Signing { message: String },

    #[error("{method} {url} giving up after {attempts} attempt(s)")]
    GaveUp {
        method: String,
        url: String,
        attempts: u32,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Error::Signing {
            message: msg.into(),
        }
    }

    /// Build the classification error for a non-successful HTTP status.
    pub fn unexpected_status(status: u16) -> Self {
        Error::UnexpectedStatus {
            status,
            status_line: crate::transport::status_line(status),
        }
    }

    /// Whether the error describes a transient condition worth another attempt.
    ///
    /// Mirrors the classification applied inside the send loop, so callers that
    /// wrap [`crate::RpcClient`] in their own orchestration can reuse it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(e) => !crate::resilience::is_permanent_transport_error(e),
            Error::UnexpectedStatus { status, .. } => crate::resilience::is_retryable_status(*status),
            _ => false,
        }
    }

    /// True for both explicit cancellation and deadline expiry.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
