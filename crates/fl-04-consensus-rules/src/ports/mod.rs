//! # Ports
//!
//! Consensus rules have no outbound port of their own; transaction checks
//! go through `fl_03_validation::TransactionValidator`.

pub mod inbound;
