//! Accepted-transaction verdicts.

use fl_02_ledger_model::Operation;
use shared_types::{OutputRef, TxId};

/// Whether an accepted transaction consumes its inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Claim spent outputs in the store on acceptance.
    #[default]
    Commit,
    /// Run every check but leave the store untouched (block validation).
    DryRun,
}

/// Successful outcome of the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedTransaction {
    pub tx_id: TxId,
    pub operation: Operation,
    /// Outputs this transaction spends, sorted.
    pub spent: Vec<OutputRef>,
    pub mode: ValidationMode,
}
