//! Integration flows across the ledger crates.

#[cfg(test)]
pub mod fixtures;

mod conditions;
mod consensus;
mod ledger_model;
mod node_flow;
mod recovery;
mod validation;
