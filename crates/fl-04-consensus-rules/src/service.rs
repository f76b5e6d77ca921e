//! # Default Consensus Rules
//!
//! Delegates transaction checks to the validation pipeline and enforces the
//! vote invariants against the federation keyring.

use crate::domain::election::{BlockVerdict, ConsensusStrategy};
use crate::domain::errors::{ConsensusError, ConsensusResult, VoteFault};
use crate::domain::keyring::Keyring;
use crate::ports::inbound::{ConsensusRules, ValidatedBlock};
use async_trait::async_trait;
use fl_01_crypto_conditions::{make_condition, verify};
use fl_02_ledger_model::{now_millis, Block, ModelError, Operation, Transaction, Vote, VoteBody};
use fl_03_validation::{TransactionValidator, ValidatedTransaction, ValidationResult};
use parking_lot::Mutex;
use shared_crypto::{Keypair, PublicKey};
use shared_types::BlockId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DefaultConsensusRules {
    strategy: ConsensusStrategy,
    keyring: Keyring,
    validator: Arc<dyn TransactionValidator>,
    /// Voters seen per block.
    seen_votes: Mutex<HashMap<BlockId, HashSet<PublicKey>>>,
}

impl DefaultConsensusRules {
    pub fn new(
        strategy: ConsensusStrategy,
        keyring: Keyring,
        validator: Arc<dyn TransactionValidator>,
    ) -> Self {
        Self {
            strategy,
            keyring,
            validator,
            seen_votes: Mutex::new(HashMap::new()),
        }
    }

    fn validate_genesis(&self, block: &Block) -> ConsensusResult<ValidatedBlock> {
        let [tx] = block.transactions() else {
            return Err(ConsensusError::InvalidGenesis(format!(
                "expected one transaction, found {}",
                block.transactions().len()
            )));
        };
        if tx.operation() != Operation::Genesis {
            return Err(ConsensusError::InvalidGenesis(format!(
                "expected a GENESIS transaction, found {}",
                tx.operation().as_str()
            )));
        }
        tx.validate_structure()?;
        if !tx.has_valid_id()? {
            return Err(ConsensusError::InvalidGenesis("transaction id mismatch".into()));
        }
        let signer = [*block.node_pubkey()];
        let messages = tx.signing_messages()?;
        let ([input], [message]) = (tx.inputs(), messages.as_slice()) else {
            return Err(ConsensusError::InvalidGenesis("expected exactly one input".into()));
        };
        if input.owners_before != signer {
            return Err(ConsensusError::InvalidGenesis(
                "genesis transaction not issued by the block signer".into(),
            ));
        }
        let condition = make_condition(&signer, None).map_err(ModelError::from)?;
        if !verify(&input.fulfillment, &condition, message) {
            return Err(ConsensusError::InvalidGenesis(
                "genesis fulfillment does not verify against the block signer".into(),
            ));
        }
        Ok(ValidatedBlock {
            block_id: block.id().clone(),
            height: block.height(),
            transactions: Vec::new(),
        })
    }

    fn check_no_internal_conflicts(block: &Block) -> ConsensusResult<()> {
        let mut tx_ids = HashSet::new();
        let mut spent = HashSet::new();
        for tx in block.transactions() {
            if !tx_ids.insert(tx.id()) {
                return Err(ConsensusError::DuplicateTransactionInBlock(tx.id().clone()));
            }
            for link in tx.inputs().iter().filter_map(|input| input.fulfills.as_ref()) {
                if !spent.insert(link) {
                    return Err(ConsensusError::DuplicateSpendInBlock(link.clone()));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ConsensusRules for DefaultConsensusRules {
    fn strategy(&self) -> ConsensusStrategy {
        self.strategy
    }

    fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    async fn validate_transaction(
        &self,
        tx: &Transaction,
    ) -> ValidationResult<ValidatedTransaction> {
        self.validator.validate(tx).await
    }

    async fn validate_block(&self, block: &Block) -> ConsensusResult<ValidatedBlock> {
        let computed = block.recompute_id()?;
        if &computed != block.id() {
            return Err(ConsensusError::BlockIdMismatch {
                declared: block.id().clone(),
                computed,
            });
        }
        if !block.verify_signature() {
            return Err(ConsensusError::InvalidBlockSignature(block.id().clone()));
        }
        if !self.keyring.contains(block.node_pubkey()) {
            return Err(ConsensusError::UnidentifiableSigner(*block.node_pubkey()));
        }

        if block.is_genesis() {
            return self.validate_genesis(block);
        }
        if block.height() == 0 || block.previous_block().is_none() {
            return Err(ConsensusError::InvalidHeight {
                height: block.height(),
            });
        }

        Self::check_no_internal_conflicts(block)?;

        let mut transactions = Vec::with_capacity(block.transactions().len());
        for (index, tx) in block.transactions().iter().enumerate() {
            let verdict = self.validator.dry_run(tx).await.map_err(|source| {
                ConsensusError::Transaction {
                    index,
                    tx_id: tx.id().clone(),
                    source,
                }
            })?;
            transactions.push(verdict);
        }

        debug!(
            block_id = %block.id(),
            height = block.height(),
            transactions = transactions.len(),
            "block validated"
        );
        Ok(ValidatedBlock {
            block_id: block.id().clone(),
            height: block.height(),
            transactions,
        })
    }

    fn create_genesis_block(&self, node: &Keypair) -> ConsensusResult<Block> {
        let genesis_tx = Transaction::genesis(node)?;
        Ok(Block::genesis(genesis_tx, node)?)
    }

    fn sign_vote(
        &self,
        block_id: &BlockId,
        previous_block: Option<&BlockId>,
        verdict: &BlockVerdict,
        keypair: &Keypair,
    ) -> ConsensusResult<Vote> {
        let invalid_reason = match verdict {
            BlockVerdict::Valid => None,
            BlockVerdict::Invalid { reason } => Some(reason.clone()),
        };
        let body = VoteBody {
            voting_for_block: block_id.clone(),
            previous_block: previous_block.cloned(),
            is_block_valid: verdict.is_valid(),
            invalid_reason,
            timestamp: now_millis(),
        };
        Ok(Vote::sign(body, keypair)?)
    }

    fn check_vote(&self, vote: &Vote) -> Result<(), VoteFault> {
        let voter = vote.node_pubkey;
        let fault = if !self.keyring.contains(&voter) {
            Some(VoteFault::UnidentifiableVoter(voter))
        } else if !vote.verify_signature() {
            Some(VoteFault::ImproperVote { voter })
        } else if !self
            .seen_votes
            .lock()
            .entry(vote.block_id().clone())
            .or_default()
            .insert(voter)
        {
            Some(VoteFault::MultipleVotes {
                voter,
                block_id: vote.block_id().clone(),
            })
        } else {
            None
        };

        match fault {
            Some(fault) => {
                warn!(voter = %voter, block_id = %vote.block_id(), %fault, "vote dropped");
                Err(fault)
            }
            None => Ok(()),
        }
    }

    fn forget_votes(&self, block_id: &BlockId) {
        self.seen_votes.lock().remove(block_id);
    }

    fn forget_all_votes(&self) {
        self.seen_votes.lock().clear();
    }
}

/// The rule set for `strategy`, fixed for the life of the process.
pub fn select_rules(
    strategy: ConsensusStrategy,
    keyring: Keyring,
    validator: Arc<dyn TransactionValidator>,
) -> Arc<dyn ConsensusRules> {
    Arc::new(DefaultConsensusRules::new(strategy, keyring, validator))
}
