//! # Domain Layer
//!
//! Value objects and their invariants. No I/O.

pub mod asset;
pub mod block;
pub mod errors;
pub mod io;
pub mod transaction;
pub mod vote;
