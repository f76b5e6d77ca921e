//! Error types for chain recovery.

use crate::ports::outbound::OracleError;
use fl_03_validation::StoreError;
use fl_04_consensus_rules::ConsensusError;
use shared_types::{BlockId, Height};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecoveryError {
    /// A block was reached twice, or heights stopped decreasing.
    #[error("Cyclic predecessor chain at block {block_id}")]
    CyclicChain { block_id: BlockId },

    #[error("Block {block_id} has no reachable predecessor (missing {missing:?})")]
    BrokenChain {
        block_id: BlockId,
        missing: Option<BlockId>,
    },

    #[error("Local height {local} is {gap} above consensus height {oracle}, limit is {limit}")]
    RollbackLimitExceeded {
        local: Height,
        oracle: Height,
        gap: u64,
        limit: u64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("Genesis creation failed: {0}")]
    Genesis(#[from] ConsensusError),
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;
