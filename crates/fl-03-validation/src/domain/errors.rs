//! Validation fault taxonomy.

use crate::ports::outbound::StoreError;
use fl_02_ledger_model::ModelError;
use shared_types::{EncodingError, OutputRef, TxId};
use thiserror::Error;

/// Broad class of a validation failure.
///
/// Everything except `Transient` is a permanent rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// Malformed shape, bad amounts, missing signatures
    Structural,
    /// Bad signatures, unsatisfied conditions, tampered ids
    Cryptographic,
    /// Disagreement with committed ledger state
    Consistency,
    /// Store timeout or unavailability; retry
    Transient,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Phase A rejection
    #[error("Structural validation failed: {0}")]
    Structural(#[from] ModelError),

    #[error("GENESIS transactions are only created by chain recovery")]
    GenesisNotAllowed,

    #[error("Transaction {0} is already committed in a valid block")]
    DuplicateTransaction(TxId),

    #[error("Input spends {0}, which is not in a valid block")]
    InputNotInValidBlock(OutputRef),

    #[error("Output {0} does not exist")]
    OutputNotFound(OutputRef),

    #[error("Output {output} already spent by {spent_by}")]
    DoubleSpend { output: OutputRef, spent_by: TxId },

    #[error("Fulfillment of input {index} does not satisfy its condition")]
    InvalidSignature { index: usize },

    #[error("Amount not conserved: inputs {inputs}, outputs {outputs}")]
    AmountMismatch { inputs: u64, outputs: u64 },

    #[error("Indivisible asset {asset_id} moved with amount {amount}")]
    IndivisibleAmount { asset_id: TxId, amount: u64 },

    #[error("Asset {0} has no minting transaction")]
    AssetNotFound(TxId),

    #[error("Input asset {found} differs from transaction asset {expected}")]
    AssetIdMismatch { expected: TxId, found: TxId },

    #[error("Declared id {declared} does not match computed id {computed}")]
    HashMismatch { declared: TxId, computed: TxId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ValidationError {
    pub fn class(&self) -> FaultClass {
        match self {
            ValidationError::Structural(_) | ValidationError::GenesisNotAllowed => {
                FaultClass::Structural
            }
            ValidationError::InvalidSignature { .. } | ValidationError::HashMismatch { .. } => {
                FaultClass::Cryptographic
            }
            ValidationError::DuplicateTransaction(_)
            | ValidationError::InputNotInValidBlock(_)
            | ValidationError::OutputNotFound(_)
            | ValidationError::DoubleSpend { .. }
            | ValidationError::AmountMismatch { .. }
            | ValidationError::IndivisibleAmount { .. }
            | ValidationError::AssetNotFound(_)
            | ValidationError::AssetIdMismatch { .. } => FaultClass::Consistency,
            ValidationError::Store(err) if err.is_transient() => FaultClass::Transient,
            ValidationError::Store(_) => FaultClass::Consistency,
        }
    }

    /// Whether retrying the same transaction may succeed.
    pub fn is_transient(&self) -> bool {
        self.class() == FaultClass::Transient
    }

    /// The losing side of a spend race, as opposed to any other rejection.
    pub fn is_double_spend(&self) -> bool {
        matches!(self, ValidationError::DoubleSpend { .. })
    }
}

impl From<EncodingError> for ValidationError {
    fn from(err: EncodingError) -> Self {
        ValidationError::Structural(ModelError::Encoding(err))
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
