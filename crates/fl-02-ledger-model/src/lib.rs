//! # Ledger Model (FL-02)
//!
//! Immutable value objects for everything the ledger stores: assets,
//! transactions with their inputs and outputs, blocks and votes.
//!
//! ## Transactions
//!
//! A transaction is one of three tagged operations:
//!
//! | Operation  | Inputs                          | Asset                  |
//! |------------|---------------------------------|------------------------|
//! | `CREATE`   | one, self-authorizing           | full `Asset` definition |
//! | `TRANSFER` | one per spent output            | link to the CREATE id  |
//! | `GENESIS`  | one, signed by the node         | `{"genesis": true}`    |
//!
//! Loose JSON documents are parsed into typed values once, at
//! `Transaction::from_dict`. `validate_structure` then applies every rule
//! that needs no store access.
//!
//! ## Identity
//!
//! `id` is the SHA3-256 of the canonical document with `id` removed. Signing
//! returns a new transaction with a freshly derived id; a parsed document
//! keeps its declared id so tampering can be detected later.

pub mod domain;

pub use domain::asset::{Asset, AssetLink};
pub use domain::block::{now_millis, Block, BlockStatus};
pub use domain::errors::{ModelError, ModelResult};
pub use domain::io::{Input, Output};
pub use domain::transaction::{Operation, Transaction, TransactionKind, TX_VERSION};
pub use domain::vote::{Vote, VoteBody};
