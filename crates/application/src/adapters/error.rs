//! Adapter-internal failures.
//!
//! These never cross `ModelAdapter::solve`; they are rendered into the error
//! string of a failed `ModelResponse`.

use exam_bench_common::Transient;
use thiserror::Error;

/// Longest provider error body kept in a result record
const MAX_BODY_CHARS: usize = 500;

/// A failed provider call
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The per-call timeout elapsed
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The provider answered with no text
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The provider body did not have the expected shape
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl AdapterError {
    pub(crate) fn from_reqwest(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            Self::Timeout(timeout_secs)
        } else {
            Self::Http(error)
        }
    }

    pub(crate) fn status(status: reqwest::StatusCode, body: &str) -> Self {
        let body: String = body.trim().chars().take(MAX_BODY_CHARS).collect();
        Self::Status {
            status: status.as_u16(),
            body,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Http(_) => "HTTP_ERROR",
            Self::Status { status: 429, .. } => "RATE_LIMITED",
            Self::Status { .. } => "PROVIDER_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }
}

impl Transient for AdapterError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(error) => error.is_connect() || error.is_timeout(),
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Timeout(_) => true,
            Self::EmptyResponse | Self::MalformedResponse(_) => false,
        }
    }
}
