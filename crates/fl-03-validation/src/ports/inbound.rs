//! # Inbound Ports
//!
//! API exposed to the consensus rules and the node facade.

use crate::domain::errors::ValidationResult;
use crate::domain::verdict::ValidatedTransaction;
use async_trait::async_trait;
use fl_02_ledger_model::Transaction;

#[async_trait]
pub trait TransactionValidator: Send + Sync {
    /// Run both phases and claim the spent outputs on success.
    async fn validate(&self, tx: &Transaction) -> ValidationResult<ValidatedTransaction>;

    /// Run both phases without touching the store. Outputs already claimed
    /// by `tx` itself are not a double-spend.
    async fn dry_run(&self, tx: &Transaction) -> ValidationResult<ValidatedTransaction>;
}
