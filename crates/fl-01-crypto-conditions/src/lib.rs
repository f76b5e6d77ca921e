//! # Crypto-Condition Engine (FL-01)
//!
//! Builds, fulfills and verifies the cryptographic locks placed on
//! transaction outputs.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Pure cryptographic logic, no I/O
//! - **Ports Layer** (`ports/`): The inbound API other subsystems call
//! - **Service Layer** (`service.rs`): Wires domain logic to the port
//!
//! ## Condition Types
//!
//! - `ed25519-sha-256`: satisfied by one Ed25519 signature from the named key
//! - `threshold-sha-256`: satisfied when the weights of satisfied
//!   sub-conditions reach the threshold; sub-conditions may nest
//!
//! ## Guarantees
//!
//! - `verify` is pure, never panics and never errors: malformed input is
//!   simply `false`, so it may run on any thread without locking
//! - Conditions have a canonical encoding; their `uri` fingerprint is a
//!   digest of it and is identical on every node

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::condition::{
    make_condition, Condition, ConditionDetails, ThresholdPolicy, WeightedDetails,
    ED25519_COST, ED25519_TYPE, THRESHOLD_TYPE,
};
pub use domain::errors::ConditionError;
pub use domain::fulfillment::{fulfill, verify, Fulfillment, WeightedFulfillment};
pub use ports::inbound::{BatchVerificationResult, ConditionApi, VerificationItem};
pub use service::ConditionService;
