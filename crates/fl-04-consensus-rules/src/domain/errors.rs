//! Error types for consensus rules.

use fl_02_ledger_model::ModelError;
use fl_03_validation::ValidationError;
use shared_crypto::PublicKey;
use shared_types::{BlockId, OutputRef, TxId};
use thiserror::Error;

/// Why a vote was dropped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoteFault {
    #[error("{voter} already voted on block {block_id}")]
    MultipleVotes { voter: PublicKey, block_id: BlockId },

    #[error("Vote signature from {voter} does not verify")]
    ImproperVote { voter: PublicKey },

    #[error("Voter {0} is not a federation member")]
    UnidentifiableVoter(PublicKey),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("Block {declared} does not match its computed id {computed}")]
    BlockIdMismatch { declared: BlockId, computed: BlockId },

    #[error("Invalid block signature on {0}")]
    InvalidBlockSignature(BlockId),

    #[error("Block signer {0} is not a federation member")]
    UnidentifiableSigner(PublicKey),

    #[error("Only the genesis block may sit at height {height} without a predecessor")]
    InvalidHeight { height: u64 },

    #[error("Malformed genesis block: {0}")]
    InvalidGenesis(String),

    #[error("Transaction {0} appears twice in the block")]
    DuplicateTransactionInBlock(TxId),

    #[error("Output {0} is spent twice within the block")]
    DuplicateSpendInBlock(OutputRef),

    #[error("Transaction {index} ({tx_id}) is invalid: {source}")]
    Transaction {
        index: usize,
        tx_id: TxId,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Vote(#[from] VoteFault),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ConsensusError {
    /// Whether the block may validate on retry (a store failure while
    /// checking a contained transaction).
    pub fn is_transient(&self) -> bool {
        matches!(self, ConsensusError::Transaction { source, .. } if source.is_transient())
    }
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
