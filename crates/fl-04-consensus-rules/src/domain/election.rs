//! Vote tallying for a single block.

use fl_02_ledger_model::BlockStatus;
use serde::{Deserialize, Serialize};
use shared_crypto::PublicKey;
use std::collections::HashMap;

/// Statically configured rule set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusStrategy {
    /// Simple majority of the federation.
    #[default]
    Federation,
    /// Every member must vote valid.
    Unanimous,
}

impl ConsensusStrategy {
    /// Status reached by `valid` and `invalid` votes out of `members`.
    pub fn tally(&self, members: usize, valid: usize, invalid: usize) -> BlockStatus {
        match self {
            ConsensusStrategy::Federation => {
                if invalid >= members.div_ceil(2) && invalid > 0 {
                    BlockStatus::Invalid
                } else if valid > members / 2 {
                    BlockStatus::Valid
                } else {
                    BlockStatus::Undecided
                }
            }
            ConsensusStrategy::Unanimous => {
                if invalid > 0 {
                    BlockStatus::Invalid
                } else if members > 0 && valid >= members {
                    BlockStatus::Valid
                } else {
                    BlockStatus::Undecided
                }
            }
        }
    }
}

/// The node's verdict on a block, as cast in a vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockVerdict {
    Valid,
    Invalid { reason: String },
}

impl BlockVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, BlockVerdict::Valid)
    }
}

/// Running election for one block. Votes must be checked before they are
/// recorded here.
#[derive(Clone, Debug)]
pub struct BlockElection {
    strategy: ConsensusStrategy,
    members: usize,
    votes: HashMap<PublicKey, bool>,
    status: BlockStatus,
}

impl BlockElection {
    pub fn new(strategy: ConsensusStrategy, members: usize) -> Self {
        Self {
            strategy,
            members,
            votes: HashMap::new(),
            status: BlockStatus::Undecided,
        }
    }

    /// Count a vote and return the resulting status. Once terminal, the
    /// status is frozen and further votes are ignored; a voter's first vote
    /// is the one that counts.
    pub fn record(&mut self, voter: PublicKey, is_valid: bool) -> BlockStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        self.votes.entry(voter).or_insert(is_valid);
        let valid = self.votes.values().filter(|&&vote| vote).count();
        let invalid = self.votes.len() - valid;
        self.status = self.strategy.tally(self.members, valid, invalid);
        self.status
    }

    pub fn status(&self) -> BlockStatus {
        self.status
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }
}
