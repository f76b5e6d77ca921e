//! In-memory ledger store.
//!
//! All tables sit behind one `RwLock`, so every port method is a single
//! atomic step. Spend claims are a compare-and-set on the `spent` table.
//! A block turning VALID takes over the claims on its inputs.

use crate::ports::LedgerStore;
use async_trait::async_trait;
use fl_02_ledger_model::{Block, BlockStatus, Output, Transaction};
use fl_03_validation::{CommittedTransaction, SpendOutcome, StoreError, TransactionStore};
use fl_05_chain_recovery::{ChainStore, DropOutcome, GenesisOutcome, InitOutcome};
use parking_lot::RwLock;
use shared_types::{BlockId, Height, OutputRef, TxId};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

struct StoredTransaction {
    transaction: Transaction,
    block_id: Option<BlockId>,
}

#[derive(Default)]
struct Tables {
    initialized: bool,
    /// One block per height.
    blocks: BTreeMap<Height, Block>,
    block_heights: HashMap<BlockId, Height>,
    statuses: HashMap<BlockId, BlockStatus>,
    transactions: HashMap<TxId, StoredTransaction>,
    /// Backlog in arrival order.
    backlog: Vec<TxId>,
    spent: HashMap<OutputRef, TxId>,
}

impl Tables {
    fn status_of(&self, block_id: Option<&BlockId>) -> BlockStatus {
        block_id
            .and_then(|id| self.statuses.get(id))
            .copied()
            .unwrap_or_default()
    }

    /// Place `block` and its transactions, claiming their inputs.
    fn index_block(&mut self, block: &Block, status: BlockStatus) {
        let block_id = block.id().clone();
        for tx in block.transactions() {
            for link in tx.inputs().iter().filter_map(|input| input.fulfills.clone()) {
                self.spent.entry(link).or_insert_with(|| tx.id().clone());
            }
            self.backlog.retain(|id| id != tx.id());
            self.transactions.insert(
                tx.id().clone(),
                StoredTransaction {
                    transaction: tx.clone(),
                    block_id: Some(block_id.clone()),
                },
            );
        }
        self.block_heights.insert(block_id.clone(), block.height());
        self.statuses.insert(block_id, status);
        self.blocks.insert(block.height(), block.clone());
    }

    /// Drop `tx_id` and every claim it holds.
    fn remove_transaction(&mut self, tx_id: &TxId) {
        self.transactions.remove(tx_id);
        self.backlog.retain(|id| id != tx_id);
        self.spent.retain(|_, spender| *spender != *tx_id);
    }

    /// Give the transactions of a VALID block the claims on their inputs.
    /// Backlog transactions that held one of those claims are evicted.
    fn settle_spends(&mut self, block_id: &BlockId) {
        let Some(block) = self
            .block_heights
            .get(block_id)
            .and_then(|height| self.blocks.get(height))
            .cloned()
        else {
            return;
        };
        for tx in block.transactions() {
            for link in tx.inputs().iter().filter_map(|input| input.fulfills.clone()) {
                let holder = self.spent.insert(link.clone(), tx.id().clone());
                if let Some(loser) = holder.filter(|holder| holder != tx.id()) {
                    if self.backlog.contains(&loser) {
                        debug!(
                            tx_id = %loser,
                            output = %link,
                            winner = %tx.id(),
                            "evicting conflicting backlog transaction"
                        );
                        self.remove_transaction(&loser);
                    }
                }
            }
        }
    }

    /// Evict backlog transactions spending outputs of `removed`.
    fn evict_dependents(&mut self, removed: &HashSet<TxId>) {
        let orphans: Vec<TxId> = self
            .backlog
            .iter()
            .filter(|id| {
                self.transactions.get(*id).is_some_and(|stored| {
                    stored
                        .transaction
                        .inputs()
                        .iter()
                        .filter_map(|input| input.fulfills.as_ref())
                        .any(|link| removed.contains(&link.tx_id))
                })
            })
            .cloned()
            .collect();
        for id in &orphans {
            debug!(tx_id = %id, "evicting backlog transaction with a rolled back input");
            self.remove_transaction(id);
        }
    }
}

/// [`LedgerStore`] over process memory.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.tables.read().blocks.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.tables.read().transactions.len()
    }
}

#[async_trait]
impl TransactionStore for InMemoryLedgerStore {
    async fn get_transaction(&self, id: &TxId) -> Result<Option<CommittedTransaction>, StoreError> {
        let tables = self.tables.read();
        Ok(tables.transactions.get(id).map(|stored| CommittedTransaction {
            transaction: stored.transaction.clone(),
            block_id: stored.block_id.clone(),
            block_status: tables.status_of(stored.block_id.as_ref()),
        }))
    }

    async fn get_output(&self, link: &OutputRef) -> Result<Option<Output>, StoreError> {
        let tables = self.tables.read();
        Ok(tables.transactions.get(&link.tx_id).and_then(|stored| {
            stored
                .transaction
                .outputs()
                .get(link.output_index as usize)
                .cloned()
        }))
    }

    async fn spent_by(&self, link: &OutputRef) -> Result<Option<TxId>, StoreError> {
        Ok(self.tables.read().spent.get(link).cloned())
    }

    async fn mark_spent(
        &self,
        link: &OutputRef,
        spender: &TxId,
    ) -> Result<SpendOutcome, StoreError> {
        let mut tables = self.tables.write();
        Ok(match tables.spent.entry(link.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(spender.clone());
                SpendOutcome::Claimed
            }
            Entry::Occupied(slot) if slot.get() == spender => SpendOutcome::AlreadyClaimed,
            Entry::Occupied(slot) => SpendOutcome::Conflict {
                spent_by: slot.get().clone(),
            },
        })
    }

    async fn release_spent(&self, link: &OutputRef, spender: &TxId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.spent.get(link) == Some(spender) {
            tables.spent.remove(link);
        }
        Ok(())
    }
}

#[async_trait]
impl ChainStore for InMemoryLedgerStore {
    async fn init_database(&self) -> Result<InitOutcome, StoreError> {
        let mut tables = self.tables.write();
        if tables.initialized {
            return Ok(InitOutcome::AlreadyExists);
        }
        tables.initialized = true;
        Ok(InitOutcome::Created)
    }

    async fn drop_database(&self) -> Result<DropOutcome, StoreError> {
        let mut tables = self.tables.write();
        if !tables.initialized {
            return Ok(DropOutcome::DoesNotExist);
        }
        *tables = Tables::default();
        Ok(DropOutcome::Dropped)
    }

    async fn get_latest_block(&self) -> Result<Option<Block>, StoreError> {
        Ok(self
            .tables
            .read()
            .blocks
            .last_key_value()
            .map(|(_, block)| block.clone()))
    }

    async fn get_block(&self, id: &BlockId) -> Result<Option<Block>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .block_heights
            .get(id)
            .and_then(|height| tables.blocks.get(height))
            .cloned())
    }

    async fn delete_latest_block(&self) -> Result<Option<Block>, StoreError> {
        let mut tables = self.tables.write();
        let Some((_, block)) = tables.blocks.pop_last() else {
            return Ok(None);
        };
        tables.block_heights.remove(block.id());
        tables.statuses.remove(block.id());
        let removed: HashSet<TxId> =
            block.transactions().iter().map(|tx| tx.id().clone()).collect();
        for id in &removed {
            tables.remove_transaction(id);
        }
        tables.evict_dependents(&removed);
        Ok(Some(block))
    }

    async fn delete_zombie_transactions(&self) -> Result<usize, StoreError> {
        let mut tables = self.tables.write();
        let zombies: Vec<TxId> = tables
            .transactions
            .iter()
            .filter(|(_, stored)| {
                tables.status_of(stored.block_id.as_ref()) == BlockStatus::Invalid
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &zombies {
            tables.remove_transaction(id);
        }
        Ok(zombies.len())
    }

    async fn insert_genesis_block(&self, block: &Block) -> Result<GenesisOutcome, StoreError> {
        let mut tables = self.tables.write();
        if tables.blocks.contains_key(&0) {
            return Ok(GenesisOutcome::AlreadyExists);
        }
        tables.index_block(block, BlockStatus::Valid);
        Ok(GenesisOutcome::Created(block.id().clone()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn write_transaction(&self, tx: &Transaction) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.transactions.contains_key(tx.id()) {
            return Ok(());
        }
        tables.transactions.insert(
            tx.id().clone(),
            StoredTransaction {
                transaction: tx.clone(),
                block_id: None,
            },
        );
        tables.backlog.push(tx.id().clone());
        Ok(())
    }

    async fn backlog(&self) -> Result<Vec<Transaction>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .backlog
            .iter()
            .filter_map(|id| tables.transactions.get(id))
            .map(|stored| stored.transaction.clone())
            .collect())
    }

    async fn write_block(&self, block: &Block) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables.blocks.get(&block.height()) {
            return Err(StoreError::Conflict(format!(
                "height {} already holds block {}",
                block.height(),
                existing.id()
            )));
        }
        tables.index_block(block, BlockStatus::Undecided);
        Ok(())
    }

    async fn set_block_status(
        &self,
        id: &BlockId,
        status: BlockStatus,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let Some(current) = tables.statuses.get_mut(id) else {
            return Err(StoreError::Conflict(format!("unknown block {id}")));
        };
        *current = status;
        if status == BlockStatus::Valid {
            tables.settle_spends(id);
        }
        Ok(())
    }

    async fn block_status(&self, id: &BlockId) -> Result<Option<BlockStatus>, StoreError> {
        Ok(self.tables.read().statuses.get(id).copied())
    }
}
