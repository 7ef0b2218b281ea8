//! Error types for the DIMP core.

use thiserror::Error;

/// Errors that can occur while decoding, encoding or handling content.
///
/// Unknown content types and unknown command names are not errors; they
/// decode into the generic wrappers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field is missing or has the wrong shape.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("invalid identifier: {0:?}")]
    InvalidId(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("crypto error: {0}")]
    CryptoError(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl CoreError {
    /// Shorthand for a missing required field.
    pub(crate) fn missing(field: &str) -> Self {
        CoreError::MalformedRecord(format!("missing field `{field}`"))
    }

    /// Shorthand for a field present with the wrong shape.
    pub(crate) fn wrong_shape(field: &str, expected: &str) -> Self {
        CoreError::MalformedRecord(format!("field `{field}` is not {expected}"))
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
