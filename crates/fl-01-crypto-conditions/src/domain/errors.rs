//! # Condition Errors
//!
//! Error types raised while building or signing conditions. Verification
//! itself never errors; it answers `false`.

use shared_crypto::PublicKey;
use shared_types::EncodingError;
use thiserror::Error;

/// Errors that can occur while constructing or fulfilling a condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConditionError {
    /// A condition needs at least one public key
    #[error("Condition requires at least one public key")]
    NoPublicKeys,

    /// A threshold node has no sub-conditions
    #[error("Threshold condition has no sub-conditions")]
    EmptyThreshold,

    /// Threshold is zero or unreachable with the given weights
    #[error("Invalid threshold {threshold} for total weight {total_weight}")]
    InvalidThreshold { threshold: u32, total_weight: u64 },

    /// Weight of zero on a sub-condition
    #[error("Sub-condition weight must be positive")]
    ZeroWeight,

    /// Weight list does not line up with the key list
    #[error("Weight count mismatch: {keys} keys, {weights} weights")]
    WeightCountMismatch { keys: usize, weights: usize },

    /// A supplied private key does not belong to any leaf of the condition
    #[error("Private key for {0} does not match any condition leaf")]
    KeypairMismatch(PublicKey),

    /// Declared fingerprint does not match the condition details
    #[error("Condition uri mismatch: declared {declared}, derived {derived}")]
    UriMismatch { declared: String, derived: String },

    /// Canonical encoding failed
    #[error("Condition encoding failed: {0}")]
    Encoding(#[from] EncodingError),
}
