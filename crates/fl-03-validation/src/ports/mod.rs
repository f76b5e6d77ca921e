//! # Ports
//!
//! - `inbound`: what callers of the pipeline use
//! - `outbound`: the persistence store the pipeline depends on

pub mod inbound;
pub mod outbound;
