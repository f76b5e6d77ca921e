//! # Outbound Ports
//!
//! Block-level store queries and the external consensus height source.

use crate::domain::outcomes::{DropOutcome, GenesisOutcome, InitOutcome};
use async_trait::async_trait;
use fl_02_ledger_model::Block;
use fl_03_validation::StoreError;
use shared_types::{BlockId, Height};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("Consensus height source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ChainStore: Send + Sync {
    async fn init_database(&self) -> Result<InitOutcome, StoreError>;

    async fn drop_database(&self) -> Result<DropOutcome, StoreError>;

    /// Highest block, whatever its status.
    async fn get_latest_block(&self) -> Result<Option<Block>, StoreError>;

    async fn get_block(&self, id: &BlockId) -> Result<Option<Block>, StoreError>;

    /// Remove the highest block together with its transactions and the
    /// spend claims they hold. Returns the removed block.
    async fn delete_latest_block(&self) -> Result<Option<Block>, StoreError>;

    /// Remove transactions whose block was voted INVALID and release the
    /// spend claims they hold. Returns how many were removed.
    async fn delete_zombie_transactions(&self) -> Result<usize, StoreError>;

    /// Store `block` at height 0 unless a genesis block already exists.
    /// Check and insert are one atomic step.
    async fn insert_genesis_block(&self, block: &Block) -> Result<GenesisOutcome, StoreError>;
}

/// Height of the latest block committed by the external BFT layer.
#[async_trait]
pub trait HeightOracle: Send + Sync {
    async fn latest_height(&self) -> Result<Height, OracleError>;
}
