//! # Outbound Ports
//!
//! The persistence store as seen by the validation pipeline. The store is
//! the only shared mutable resource; `mark_spent` must be atomic from its
//! own perspective (compare-and-set on the unspent status, or a
//! serializable transaction emulating it).

use async_trait::async_trait;
use fl_02_ledger_model::{BlockStatus, Output, Transaction};
use shared_types::{BlockId, OutputRef, TxId};
use std::time::Duration;
use thiserror::Error;

/// Store failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A write contradicts stored state (e.g. a second block at a height).
    #[error("Store write conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Unavailable(_))
    }
}

/// A stored transaction with the status of the block holding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedTransaction {
    pub transaction: Transaction,
    /// `None` while the transaction waits in the backlog.
    pub block_id: Option<BlockId>,
    pub block_status: BlockStatus,
}

impl CommittedTransaction {
    pub fn in_valid_block(&self) -> bool {
        self.block_id.is_some() && self.block_status == BlockStatus::Valid
    }
}

/// Result of an atomic spend claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpendOutcome {
    /// The output was unspent and now belongs to the spender.
    Claimed,
    /// The same spender already holds the claim.
    AlreadyClaimed,
    /// Another transaction holds the claim.
    Conflict { spent_by: TxId },
}

/// Transaction and spend-status queries.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn get_transaction(&self, id: &TxId) -> Result<Option<CommittedTransaction>, StoreError>;

    async fn get_output(&self, link: &OutputRef) -> Result<Option<Output>, StoreError>;

    /// Transaction currently holding the spend claim on `link`.
    async fn spent_by(&self, link: &OutputRef) -> Result<Option<TxId>, StoreError>;

    async fn is_spent(&self, link: &OutputRef) -> Result<bool, StoreError> {
        Ok(self.spent_by(link).await?.is_some())
    }

    /// Atomically claim `link` for `spender` if it is unspent.
    async fn mark_spent(&self, link: &OutputRef, spender: &TxId)
        -> Result<SpendOutcome, StoreError>;

    /// Drop the claim on `link` if `spender` holds it. Other claims are
    /// left untouched.
    async fn release_spent(&self, link: &OutputRef, spender: &TxId) -> Result<(), StoreError>;
}
