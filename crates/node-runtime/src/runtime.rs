//! # Node Runtime
//!
//! Wires one ledger store, the validation pipeline, the consensus rules
//! and chain recovery into a node.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──→ start() ──→ ready
//!             │           │
//!             │           ├── submit_transaction ──→ backlog
//!             │           ├── propose_block      ──→ UNDECIDED block
//!             │           ├── cast_vote / receive_vote
//!             │           │        └──→ VALID | INVALID
//!             │           └── recover (re-run at any time)
//!             └── recovery: init → zombies → rollback → genesis → verify
//! ```
//!
//! Nothing is accepted before `start()` has completed recovery.

use crate::config::{ConfigError, NodeConfig};
use crate::ports::LedgerStore;
use crate::telemetry::init_logging;
use anyhow::Context;
use fl_02_ledger_model::{now_millis, Block, BlockStatus, ModelError, Transaction, Vote};
use fl_03_validation::{
    StoreError, TransactionStore, TransactionValidator, ValidatedTransaction, ValidationError,
    ValidationPipeline,
};
use fl_04_consensus_rules::{
    select_rules, BlockElection, BlockVerdict, ConsensusError, ConsensusRules, VoteFault,
};
use fl_05_chain_recovery::{
    ChainRecovery, ChainStore, HeightOracle, RecoveryError, RecoveryReport,
};
use parking_lot::Mutex;
use shared_crypto::{Keypair, PublicKey};
use shared_types::BlockId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Node has not completed startup recovery")]
    NotReady,

    #[error("Backlog is empty, nothing to propose")]
    EmptyBacklog,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transaction rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Block rejected: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Vote rejected: {0}")]
    Vote(#[from] VoteFault),

    #[error("Recovery failed: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type NodeResult<T> = Result<T, NodeError>;

/// One federation node over a [`LedgerStore`].
pub struct NodeRuntime<S: LedgerStore + 'static> {
    config: NodeConfig,
    keypair: Keypair,
    store: Arc<S>,
    rules: Arc<dyn ConsensusRules>,
    recovery: ChainRecovery,
    elections: Mutex<HashMap<BlockId, BlockElection>>,
    ready: AtomicBool,
}

impl<S: LedgerStore + 'static> NodeRuntime<S> {
    pub fn new(
        config: NodeConfig,
        store: Arc<S>,
        oracle: Arc<dyn HeightOracle>,
    ) -> NodeResult<Self> {
        config.validate()?;
        let keypair = config.node_keypair()?;

        let tx_store: Arc<dyn TransactionStore> = store.clone();
        let validator: Arc<dyn TransactionValidator> = Arc::new(ValidationPipeline::new(
            tx_store,
            config.validation.clone(),
        ));
        let rules = select_rules(
            config.consensus.strategy,
            config.consensus.keyring.clone(),
            validator,
        );

        let chain_store: Arc<dyn ChainStore> = store.clone();
        let recovery = ChainRecovery::new(
            chain_store,
            oracle,
            rules.clone(),
            keypair.clone(),
            config.recovery.clone(),
        );

        Ok(Self {
            config,
            keypair,
            store,
            rules,
            recovery,
            elections: Mutex::new(HashMap::new()),
            ready: AtomicBool::new(false),
        })
    }

    /// Install logging and run startup recovery. The node accepts work
    /// only once this returns `Ok`.
    pub async fn start(&self) -> anyhow::Result<RecoveryReport> {
        init_logging(&self.config.logging).context("logging setup failed")?;
        info!(
            node = %self.keypair.public_key(),
            strategy = ?self.rules.strategy(),
            federation = self.rules.keyring().len(),
            "starting node"
        );

        let report = self.recover().await.context("startup recovery failed")?;
        self.ready.store(true, Ordering::SeqCst);
        info!(height = ?report.final_height, "node ready");
        Ok(report)
    }

    /// Reconcile local state with the consensus height. Open elections
    /// are discarded since their blocks may be gone; votes for them count
    /// again when re-delivered.
    pub async fn recover(&self) -> NodeResult<RecoveryReport> {
        let report = self.recovery.recover().await?;
        self.elections.lock().clear();
        self.rules.forget_all_votes();
        Ok(report)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn rules(&self) -> &Arc<dyn ConsensusRules> {
        &self.rules
    }

    fn ensure_ready(&self) -> NodeResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(NodeError::NotReady)
        }
    }

    /// Validate `tx`, claim the outputs it spends and queue it for the
    /// next block. Transient failures are retried with linear backoff.
    pub async fn submit_transaction(&self, tx: &Transaction) -> NodeResult<ValidatedTransaction> {
        self.ensure_ready()?;
        let retry = &self.config.validation;

        let mut attempt = 0u32;
        let verdict = loop {
            match self.rules.validate_transaction(tx).await {
                Ok(verdict) => break verdict,
                Err(err) if err.is_transient() && attempt < retry.max_transient_retries => {
                    attempt += 1;
                    warn!(tx_id = %tx.id(), attempt, error = %err, "retrying validation");
                    tokio::time::sleep(retry.retry_backoff * attempt).await;
                }
                Err(err) => return Err(err.into()),
            }
        };

        if let Err(err) = self.store.write_transaction(tx).await {
            for link in &verdict.spent {
                if let Err(release) = self.store.release_spent(link, tx.id()).await {
                    warn!(tx_id = %tx.id(), output = %link, error = %release, "claim not released");
                }
            }
            return Err(err.into());
        }

        debug!(tx_id = %tx.id(), operation = tx.operation().as_str(), "transaction queued");
        Ok(verdict)
    }

    /// Pack the whole backlog into a signed block on top of the tip.
    pub async fn propose_block(&self) -> NodeResult<Block> {
        self.ensure_ready()?;
        let backlog = self.store.backlog().await?;
        if backlog.is_empty() {
            return Err(NodeError::EmptyBacklog);
        }
        let tip = self
            .store
            .get_latest_block()
            .await?
            .ok_or(NodeError::NotReady)?;

        let block = Block::new(
            tip.height() + 1,
            Some(tip.id().clone()),
            backlog,
            self.keypair.public_key(),
            now_millis(),
        )?
        .sign(&self.keypair)?;
        self.store.write_block(&block).await?;

        info!(
            block_id = %block.id(),
            height = block.height(),
            transactions = block.transactions().len(),
            "block proposed"
        );
        Ok(block)
    }

    /// Store a block proposed by another node. It stays UNDECIDED until
    /// the votes are in.
    pub async fn receive_block(&self, block: &Block) -> NodeResult<()> {
        self.ensure_ready()?;
        self.store.write_block(block).await?;
        debug!(block_id = %block.id(), proposer = %block.node_pubkey(), "block received");
        Ok(())
    }

    /// Judge `block` without touching the store. Only transient failures
    /// are errors; anything else is an INVALID verdict.
    pub async fn evaluate_block(&self, block: &Block) -> NodeResult<BlockVerdict> {
        match self.rules.validate_block(block).await {
            Ok(_) => Ok(BlockVerdict::Valid),
            Err(err) if err.is_transient() => Err(err.into()),
            Err(err) => {
                info!(block_id = %block.id(), reason = %err, "block judged invalid");
                Ok(BlockVerdict::Invalid {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Evaluate `block`, sign this node's vote and count it. The vote is
    /// returned for broadcast.
    pub async fn cast_vote(&self, block: &Block) -> NodeResult<(Vote, BlockStatus)> {
        self.ensure_ready()?;
        let verdict = self.evaluate_block(block).await?;
        let vote = self.rules.sign_vote(
            block.id(),
            block.previous_block(),
            &verdict,
            &self.keypair,
        )?;
        let status = self.receive_vote(&vote).await?;
        Ok((vote, status))
    }

    /// Count a vote. When the election reaches a decision the stored
    /// block status is updated and the election is dropped. Returns the
    /// election status, or the stored one for an already decided block.
    pub async fn receive_vote(&self, vote: &Vote) -> NodeResult<BlockStatus> {
        self.ensure_ready()?;
        self.rules.check_vote(vote)?;

        let block_id = vote.block_id().clone();
        let stored = self.store.block_status(&block_id).await?;
        if let Some(decided) = stored.filter(BlockStatus::is_terminal) {
            self.settle_election(&block_id);
            return Ok(decided);
        }

        let status = self
            .elections
            .lock()
            .entry(block_id.clone())
            .or_insert_with(|| self.rules.new_election())
            .record(vote.node_pubkey, vote.is_valid_verdict());

        if status.is_terminal() {
            match stored {
                Some(_) => {
                    self.store.set_block_status(&block_id, status).await?;
                    self.settle_election(&block_id);
                    info!(block_id = %block_id, ?status, "block decided");
                }
                None => warn!(block_id = %block_id, ?status, "decided block not stored locally"),
            }
        }
        Ok(status)
    }

    fn settle_election(&self, block_id: &BlockId) {
        self.elections.lock().remove(block_id);
        self.rules.forget_votes(block_id);
    }

    /// Elections still waiting for votes.
    pub fn open_elections(&self) -> usize {
        self.elections.lock().len()
    }

    pub async fn block_status(&self, block_id: &BlockId) -> NodeResult<Option<BlockStatus>> {
        Ok(self.store.block_status(block_id).await?)
    }
}
