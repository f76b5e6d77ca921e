//! # Domain Layer
//!
//! Verdicts, fault taxonomy and pipeline configuration.

pub mod config;
pub mod errors;
pub mod verdict;
