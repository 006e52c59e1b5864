//! Error types shared by the cnrates crates.

use thiserror::Error;

/// A rate string that is not a positive decimal number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid rate value: {value:?}")]
pub struct InvalidRate {
    /// The offending input, trimmed.
    pub value: String,
}

impl InvalidRate {
    /// Create a new error for the given input.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Result type alias for rate parsing.
pub type Result<T> = std::result::Result<T, InvalidRate>;
