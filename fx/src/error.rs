//! Rate fetch error types.

use thiserror::Error;

/// Errors from a single upstream fetch attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection failure or non-success HTTP status.
    #[error("Network error: {0}")]
    Network(String),

    /// The request deadline elapsed.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The response did not have the expected shape.
    #[error("Malformed response: {0}")]
    Parse(String),

    /// The response was well formed but held no usable quote.
    #[error("No quote found: {0}")]
    NotFound(String),
}

impl FetchError {
    /// Stable error code for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "NETWORK",
            FetchError::Timeout(_) => "TIMEOUT",
            FetchError::Parse(_) => "PARSE",
            FetchError::NotFound(_) => "NOT_FOUND",
        }
    }

    /// Check if a later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Timeout(_))
    }

    /// Classify a transport error raised while talking to `source`.
    pub(crate) fn from_reqwest(source: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(format!("{source}: {err}"))
        } else if err.is_decode() {
            FetchError::Parse(format!("{source}: {err}"))
        } else {
            FetchError::Network(format!("{source}: {err}"))
        }
    }
}

/// Both legs of a fallback fetch failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("primary failed ({primary}); fallback failed ({fallback})")]
pub struct FallbackError {
    pub primary: FetchError,
    pub fallback: FetchError,
}

/// Result type for a single upstream attempt.
pub type FetchResult<T> = Result<T, FetchError>;
