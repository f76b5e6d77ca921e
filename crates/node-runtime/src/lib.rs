//! # Node Runtime
//!
//! Assembles the ledger subsystems into a running federation node.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | `config` | `NodeConfig`, the one value every constructor receives |
//! | `telemetry` | `tracing` subscriber setup |
//! | `ports` | `LedgerStore`, the node's persistence contract |
//! | `adapters` | In-memory store, static height oracle |
//! | `runtime` | `NodeRuntime`: startup, submission, blocks, votes |
//!
//! ## Wiring
//!
//! ```text
//! LedgerStore ──┬──→ ValidationPipeline ──→ ConsensusRules ──┐
//!               └──→ ChainRecovery ←───────────────────────────┘
//!                         ↑
//!                    HeightOracle
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod ports;
pub mod runtime;
pub mod telemetry;

pub use adapters::{InMemoryLedgerStore, StaticHeightOracle};
pub use config::{ConfigError, ConsensusSection, NodeConfig, NodeSection, NodeSeed};
pub use ports::LedgerStore;
pub use runtime::{NodeError, NodeResult, NodeRuntime};
pub use telemetry::{init_logging, LoggingConfig};
