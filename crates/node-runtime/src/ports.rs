//! # Ledger Store Port
//!
//! The single persistence backend of a node. It serves the validation
//! pipeline ([`TransactionStore`]), chain recovery ([`ChainStore`]) and
//! the runtime's own backlog and block writes.

use async_trait::async_trait;
use fl_02_ledger_model::{Block, BlockStatus, Transaction};
use fl_03_validation::{StoreError, TransactionStore};
use fl_05_chain_recovery::ChainStore;
use shared_types::BlockId;

#[async_trait]
pub trait LedgerStore: TransactionStore + ChainStore {
    /// Add an accepted transaction to the backlog. Writing the same
    /// transaction twice is a no-op.
    async fn write_transaction(&self, tx: &Transaction) -> Result<(), StoreError>;

    /// Transactions not yet packed into a block, in arrival order.
    async fn backlog(&self) -> Result<Vec<Transaction>, StoreError>;

    /// Store an UNDECIDED block and move its transactions out of the
    /// backlog. Fails with [`StoreError::Conflict`] if the height is taken.
    async fn write_block(&self, block: &Block) -> Result<(), StoreError>;

    async fn set_block_status(&self, id: &BlockId, status: BlockStatus)
        -> Result<(), StoreError>;

    async fn block_status(&self, id: &BlockId) -> Result<Option<BlockStatus>, StoreError>;
}
