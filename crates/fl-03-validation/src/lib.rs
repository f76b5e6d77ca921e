//! # Validation Pipeline (FL-03)
//!
//! Decides ACCEPT or REJECT for an inbound transaction.
//!
//! ## Phases
//!
//! | Phase | Store access | Checks |
//! |-------|--------------|--------|
//! | A     | none         | schema, positive amounts, signature presence |
//! | B     | read + CAS   | existence in a valid block, double-spend, fulfillments, amount conservation, asset identity, hash integrity |
//!
//! Phase A failures are permanent. Phase B reads are retried by the caller
//! when they fail transiently (see [`ValidationError::is_transient`]).
//!
//! ## Double-spend safety
//!
//! Output consumption is committed last, through the store's atomic
//! `mark_spent` compare-and-set. Claims are taken in `OutputRef` order and
//! released again if any claim of the same transaction loses, so two racing
//! transactions can never both succeed.

pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::config::ValidationConfig;
pub use domain::errors::{FaultClass, ValidationError, ValidationResult};
pub use domain::verdict::{ValidatedTransaction, ValidationMode};
pub use ports::inbound::TransactionValidator;
pub use ports::outbound::{CommittedTransaction, SpendOutcome, StoreError, TransactionStore};
pub use service::ValidationPipeline;
