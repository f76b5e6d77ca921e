//! # Federated Ledger Test Suite
//!
//! Cross-crate flows that no single subsystem crate can exercise alone.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs      # Ledger harness, transaction builders
//!     ├── conditions.rs    # Signature soundness, thresholds
//!     ├── ledger_model.rs  # Round-trip, multi-owner CREATE
//!     ├── validation.rs    # Conservation, double-spend races
//!     ├── consensus.rs     # Blocks and vote integrity
//!     ├── recovery.rs      # Rollback, genesis uniqueness
//!     └── node_flow.rs     # NodeRuntime end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fl-tests
//! cargo test -p fl-tests integration::validation::
//! ```

pub mod integration;
