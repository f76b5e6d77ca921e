//! # Consensus Rules (FL-04)
//!
//! The contract the node calls to validate transactions and blocks and to
//! sign and check votes, plus the federation bookkeeping behind it.
//!
//! ## Block lifecycle
//!
//! ```text
//! UNDECIDED --(votes accumulate)--> VALID
//!           \-------------------->  INVALID
//! ```
//!
//! Both outcomes are terminal. Tallying depends on the configured
//! [`ConsensusStrategy`]:
//!
//! | Strategy     | INVALID when            | VALID when             |
//! |--------------|-------------------------|------------------------|
//! | `Federation` | invalid ≥ ⌈n/2⌉         | valid > ⌊n/2⌋          |
//! | `Unanimous`  | any invalid vote        | all n members valid    |
//!
//! ## Votes
//!
//! `verify_vote` checks keyring membership, then the signature, then that
//! the voter has not already voted on the block. Faults are reported as
//! [`VoteFault`] and the vote is dropped.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::election::{BlockElection, BlockVerdict, ConsensusStrategy};
pub use domain::errors::{ConsensusError, ConsensusResult, VoteFault};
pub use domain::keyring::Keyring;
pub use ports::inbound::{ConsensusRules, ValidatedBlock};
pub use service::{select_rules, DefaultConsensusRules};
