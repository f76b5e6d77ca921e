//! # Error Types
//!
//! Errors raised while encoding values or parsing identifiers.

use thiserror::Error;

/// Errors produced by the canonical encoding layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// The value could not be converted to JSON.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A digest identifier was not 64 lowercase hex characters.
    #[error("Invalid digest identifier: {0:?}")]
    InvalidDigest(String),
}

impl From<serde_json::Error> for EncodingError {
    fn from(err: serde_json::Error) -> Self {
        EncodingError::Serialization(err.to_string())
    }
}
