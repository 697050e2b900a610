//! HTTP transport: pooled `reqwest` client, response heads and transport errors.

pub mod http;

pub use http::HttpTransport;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

const UNKNOWN_AUTHORITY: &str = "x509: certificate signed by unknown authority";

/// Render a status code the way it appears on the wire (`"500 Internal Server Error"`).
///
/// Codes without a canonical reason, `0` included, render as the bare number.
pub fn status_line(status: u16) -> String {
    match StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}

/// Status code and headers of a received response, detached from its body.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    status: u16,
    headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn from_response(response: &reqwest::Response) -> Self {
        Self {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
        }
    }

    /// Add a header; invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Trimmed, non-empty value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        let v = self.headers.get(name)?.to_str().ok()?.trim();
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    }

    pub fn status_line(&self) -> String {
        status_line(self.status)
    }
}

/// Coarse category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Redirect,
    UnsupportedScheme,
    UnknownAuthority,
    Timeout,
    Connect,
    Body,
    Cancelled,
    Other,
}

/// A failed HTTP exchange, rendered as `<METHOD> "<URL>": <message>`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{method} \"{url}\": {message}")]
pub struct TransportError {
    method: Method,
    url: String,
    kind: TransportErrorKind,
    message: String,
    #[source]
    source: Option<Arc<reqwest::Error>>,
}

impl TransportError {
    pub fn new(method: Method, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            kind: TransportErrorKind::Other,
            message: message.into(),
            source: None,
        }
    }

    pub fn unknown_authority(method: Method, url: impl Into<String>) -> Self {
        Self::new(method, url, UNKNOWN_AUTHORITY).with_kind(TransportErrorKind::UnknownAuthority)
    }

    pub(crate) fn cancelled(method: Method, url: impl Into<String>) -> Self {
        Self::new(method, url, "request canceled").with_kind(TransportErrorKind::Cancelled)
    }

    pub fn with_kind(mut self, kind: TransportErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Convert a `reqwest` failure, normalizing the message of permanent failures.
    pub(crate) fn from_reqwest(
        method: &Method,
        url: &url::Url,
        max_redirects: usize,
        err: reqwest::Error,
    ) -> Self {
        let (kind, message) = if !matches!(url.scheme(), "http" | "https") {
            (
                TransportErrorKind::UnsupportedScheme,
                format!("unsupported protocol scheme {:?}", url.scheme()),
            )
        } else if err.is_redirect() {
            (
                TransportErrorKind::Redirect,
                format!("stopped after {} redirects", max_redirects),
            )
        } else if has_unknown_issuer(&err) {
            (TransportErrorKind::UnknownAuthority, UNKNOWN_AUTHORITY.to_string())
        } else if err.is_timeout() {
            (TransportErrorKind::Timeout, error_chain(&err))
        } else if err.is_connect() {
            (TransportErrorKind::Connect, error_chain(&err))
        } else if err.is_body() || err.is_decode() {
            (TransportErrorKind::Body, error_chain(&err))
        } else {
            (TransportErrorKind::Other, error_chain(&err))
        };

        Self {
            method: method.clone(),
            url: url.to_string(),
            kind,
            message,
            source: Some(Arc::new(err)),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(src) = cur {
        let s = src.to_string();
        if !out.ends_with(&s) {
            out.push_str(": ");
            out.push_str(&s);
        }
        cur = src.source();
    }
    out
}

fn has_unknown_issuer(err: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = cur {
        if is_unknown_issuer(e) {
            return true;
        }
        cur = e.source();
    }

    // Fall back to the rendered chain when the TLS error is not reachable by type.
    let mut cur: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = cur {
        let s = e.to_string().to_lowercase();
        if s.contains("unknownissuer")
            || s.contains("unknown issuer")
            || s.contains("signed by unknown authority")
        {
            return true;
        }
        cur = e.source();
    }
    false
}

// `io::Error::source` skips the wrapped error, so look inside explicitly.
fn is_unknown_issuer(err: &(dyn StdError + 'static)) -> bool {
    let tls = err.downcast_ref::<rustls::Error>().or_else(|| {
        err.downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    });
    matches!(
        tls,
        Some(rustls::Error::InvalidCertificate(
            rustls::CertificateError::UnknownIssuer
        ))
    )
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Redirect => "redirect",
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::UnknownAuthority => "unknown_authority",
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Body => "body",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}
