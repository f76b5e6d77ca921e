//! # Consensus Rule Contract
//!
//! Any implementation must uphold:
//! - `validate_transaction` accepts exactly what the validation pipeline
//!   accepts, and consumes the same outputs
//! - `validate_block` never consumes outputs
//! - `verify_vote` returns true at most once per (voter, block) until the
//!   block is forgotten

use crate::domain::election::{BlockElection, BlockVerdict, ConsensusStrategy};
use crate::domain::errors::{ConsensusResult, VoteFault};
use crate::domain::keyring::Keyring;
use async_trait::async_trait;
use fl_02_ledger_model::{Block, Transaction, Vote};
use fl_03_validation::{ValidatedTransaction, ValidationResult};
use shared_crypto::Keypair;
use shared_types::{BlockId, Height};

/// Summary of a block that passed `validate_block`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedBlock {
    pub block_id: BlockId,
    pub height: Height,
    pub transactions: Vec<ValidatedTransaction>,
}

#[async_trait]
pub trait ConsensusRules: Send + Sync {
    fn strategy(&self) -> ConsensusStrategy;

    fn keyring(&self) -> &Keyring;

    async fn validate_transaction(&self, tx: &Transaction)
        -> ValidationResult<ValidatedTransaction>;

    async fn validate_block(&self, block: &Block) -> ConsensusResult<ValidatedBlock>;

    fn create_genesis_block(&self, node: &Keypair) -> ConsensusResult<Block>;

    fn sign_vote(
        &self,
        block_id: &BlockId,
        previous_block: Option<&BlockId>,
        verdict: &BlockVerdict,
        keypair: &Keypair,
    ) -> ConsensusResult<Vote>;

    /// Check a vote and remember it. Faulty votes are not remembered.
    fn check_vote(&self, vote: &Vote) -> Result<(), VoteFault>;

    fn verify_vote(&self, vote: &Vote) -> bool {
        self.check_vote(vote).is_ok()
    }

    /// Drop the voters remembered for `block_id`, once its election is
    /// settled or discarded.
    fn forget_votes(&self, block_id: &BlockId);

    /// Drop every remembered voter.
    fn forget_all_votes(&self);

    /// Fresh election sized to the keyring.
    fn new_election(&self) -> BlockElection {
        BlockElection::new(self.strategy(), self.keyring().len())
    }
}
