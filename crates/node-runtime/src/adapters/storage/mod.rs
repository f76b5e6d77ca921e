//! # Storage Adapters
//!
//! Only the in-memory backend ships with the core. A durable backend
//! implements the same three ports and must keep `mark_spent` and
//! `insert_genesis_block` atomic.

pub mod memory;

pub use memory::InMemoryLedgerStore;
