//! # Chain Recovery (FL-05)
//!
//! Reconciles the local chain with the external consensus record before
//! the node accepts any transaction.
//!
//! ## Startup sequence
//!
//! 1. Initialise the database (`AlreadyExists` is informational)
//! 2. Delete zombie transactions, freeing the outputs they locked
//! 3. While the local tip is above the oracle height, delete the tip
//! 4. Create the genesis block if the chain is empty
//! 5. Walk the chain from tip to genesis, rejecting cycles and gaps
//!
//! Recovery mutates block and height state that validation reads, so it
//! must not run concurrently with validation.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::config::RecoveryConfig;
pub use domain::errors::{RecoveryError, RecoveryResult};
pub use domain::outcomes::{DropOutcome, GenesisOutcome, InitOutcome, RecoveryReport};
pub use ports::outbound::{ChainStore, HeightOracle, OracleError};
pub use service::ChainRecovery;
