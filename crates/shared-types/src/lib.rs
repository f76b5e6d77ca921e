//! # Shared Types Crate
//!
//! Identifiers and canonical encoding shared across the ledger subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: transaction ids, block ids and output links
//!   are defined once here.
//! - **Deterministic Encoding**: `canonical_json` is the only serialization
//!   that may feed a digest. Two nodes encoding the same value MUST produce
//!   the same bytes, otherwise transaction ids diverge across the federation.

pub mod encoding;
pub mod entities;
pub mod errors;

pub use encoding::{canonical_json, canonical_value, sha3_256, sha3_256_hex};
pub use entities::*;
pub use errors::*;
