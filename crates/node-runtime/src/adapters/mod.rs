//! # Adapter Implementations
//!
//! Concrete implementations of the outbound ports.
//!
//! | Adapter | Port(s) |
//! |---------|---------|
//! | `InMemoryLedgerStore` | `LedgerStore`, `TransactionStore`, `ChainStore` |
//! | `StaticHeightOracle` | `HeightOracle` |

pub mod oracle;
pub mod storage;

pub use oracle::StaticHeightOracle;
pub use storage::InMemoryLedgerStore;
