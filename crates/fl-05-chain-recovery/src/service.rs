//! # Recovery Service

use crate::domain::config::RecoveryConfig;
use crate::domain::errors::{RecoveryError, RecoveryResult};
use crate::domain::outcomes::{GenesisOutcome, InitOutcome, RecoveryReport};
use crate::ports::outbound::{ChainStore, HeightOracle};
use fl_04_consensus_rules::ConsensusRules;
use shared_crypto::Keypair;
use shared_types::Height;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ChainRecovery {
    store: Arc<dyn ChainStore>,
    oracle: Arc<dyn HeightOracle>,
    rules: Arc<dyn ConsensusRules>,
    node: Keypair,
    config: RecoveryConfig,
}

impl ChainRecovery {
    pub fn new(
        store: Arc<dyn ChainStore>,
        oracle: Arc<dyn HeightOracle>,
        rules: Arc<dyn ConsensusRules>,
        node: Keypair,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            store,
            oracle,
            rules,
            node,
            config,
        }
    }

    /// Full startup reconciliation. Safe to re-run.
    pub async fn recover(&self) -> RecoveryResult<RecoveryReport> {
        let database = self.store.init_database().await?;
        if database == InitOutcome::AlreadyExists {
            info!("database already exists");
        }

        let zombies_deleted = self.store.delete_zombie_transactions().await?;
        if zombies_deleted > 0 {
            info!(zombies_deleted, "deleted transactions from invalid blocks");
        }

        let blocks_rolled_back = self.reconcile_height().await?;

        let genesis = match self.store.get_latest_block().await? {
            Some(_) => GenesisOutcome::AlreadyExists,
            None => self.create_genesis_block().await?,
        };

        let final_height = self.verify_chain().await?;

        let report = RecoveryReport {
            database,
            zombies_deleted,
            blocks_rolled_back,
            genesis,
            final_height,
        };
        info!(?report, "chain recovery complete");
        Ok(report)
    }

    /// Delete local blocks above the consensus height. Returns how many
    /// were deleted.
    pub async fn reconcile_height(&self) -> RecoveryResult<u64> {
        let Some(mut tip) = self.store.get_latest_block().await? else {
            return Ok(0);
        };
        let oracle = self.oracle.latest_height().await?;

        let gap = tip.height().saturating_sub(oracle);
        if gap > self.config.max_rollback {
            return Err(RecoveryError::RollbackLimitExceeded {
                local: tip.height(),
                oracle,
                gap,
                limit: self.config.max_rollback,
            });
        }

        let mut removed = 0;
        while tip.height() > oracle {
            self.store.delete_latest_block().await?;
            removed += 1;
            info!(
                height = tip.height(),
                block_id = %tip.id(),
                oracle_height = oracle,
                "rolled back block ahead of consensus"
            );

            match self.store.get_latest_block().await? {
                Some(next) if next.height() >= tip.height() => {
                    return Err(RecoveryError::CyclicChain {
                        block_id: next.id().clone(),
                    });
                }
                Some(next) => tip = next,
                None => break,
            }
        }
        Ok(removed)
    }

    /// Build and store the genesis block. A second call is a no-op that
    /// reports `AlreadyExists`.
    pub async fn create_genesis_block(&self) -> RecoveryResult<GenesisOutcome> {
        let block = self.rules.create_genesis_block(&self.node)?;
        let outcome = self.store.insert_genesis_block(&block).await?;
        match &outcome {
            GenesisOutcome::Created(block_id) => info!(block_id = %block_id, "genesis block created"),
            GenesisOutcome::AlreadyExists => warn!("genesis block already exists"),
        }
        Ok(outcome)
    }

    /// Walk predecessor links from the tip down to genesis. Returns the tip
    /// height, or `None` for an empty chain.
    pub async fn verify_chain(&self) -> RecoveryResult<Option<Height>> {
        let Some(tip) = self.store.get_latest_block().await? else {
            return Ok(None);
        };
        let tip_height = tip.height();

        let mut visited = HashSet::new();
        let mut current = tip;
        loop {
            if !visited.insert(current.id().clone()) {
                return Err(RecoveryError::CyclicChain {
                    block_id: current.id().clone(),
                });
            }

            let Some(previous_id) = current.previous_block() else {
                if current.height() != 0 {
                    return Err(RecoveryError::BrokenChain {
                        block_id: current.id().clone(),
                        missing: None,
                    });
                }
                return Ok(Some(tip_height));
            };

            let previous = self.store.get_block(previous_id).await?.ok_or_else(|| {
                RecoveryError::BrokenChain {
                    block_id: current.id().clone(),
                    missing: Some(previous_id.clone()),
                }
            })?;
            if previous.height() >= current.height() {
                return Err(RecoveryError::CyclicChain {
                    block_id: previous.id().clone(),
                });
            }
            current = previous;
        }
    }
}
