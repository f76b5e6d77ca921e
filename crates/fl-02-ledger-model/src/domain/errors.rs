//! Error types for the ledger model.

use fl_01_crypto_conditions::ConditionError;
use shared_crypto::PublicKey;
use shared_types::{EncodingError, OutputRef};
use thiserror::Error;

/// Errors raised while building, parsing, signing or structurally checking
/// model values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Document shape or field types are wrong
    #[error("Schema validation failed: {0}")]
    Schema(String),

    #[error("Output {index} has no owners")]
    EmptyOwners { index: usize },

    #[error("Transaction has no issuers")]
    NoIssuers,

    #[error("Transaction has no outputs")]
    NoOutputs,

    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("Output {index} amount must be positive")]
    NonPositiveAmount { index: usize },

    /// Amount rule violated (indivisible asset, overflow)
    #[error("Amount error: {0}")]
    Amount(String),

    #[error("Input {index} of a TRANSFER does not reference an output")]
    MissingFulfills { index: usize },

    #[error("Input {index} of a {operation} must not reference an output")]
    UnexpectedFulfills { index: usize, operation: &'static str },

    #[error("Output {0} is spent twice by the same transaction")]
    DuplicateInput(OutputRef),

    #[error("Input {index} owners_before do not match its fulfillment")]
    OwnerMismatch { index: usize },

    #[error("Output {index} public_keys do not match its condition")]
    ConditionOwnerMismatch { index: usize },

    #[error("Input {index} is not fully signed")]
    MissingSignature { index: usize },

    #[error("Private key for {0} does not own any input")]
    KeypairMismatch(PublicKey),

    #[error("Output index {index} out of range ({len} outputs)")]
    OutputIndexOutOfRange { index: u32, len: usize },

    #[error("Unsupported transaction version {0:?}")]
    UnsupportedVersion(String),

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Schema(err.to_string())
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
