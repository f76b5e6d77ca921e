//! In-memory [`TransactionStore`] double with failure injection.

use crate::ports::outbound::{CommittedTransaction, SpendOutcome, StoreError, TransactionStore};
use async_trait::async_trait;
use fl_02_ledger_model::{BlockStatus, Output, Transaction};
use parking_lot::{Mutex, RwLock};
use shared_types::{BlockId, OutputRef, TxId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct MockTransactionStore {
    transactions: RwLock<HashMap<TxId, CommittedTransaction>>,
    spent: Mutex<HashMap<OutputRef, TxId>>,
    unavailable: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MockTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tx` in a block of its own with the given status, claiming
    /// the outputs it spends. Returns the synthetic block id.
    pub fn commit(&self, tx: Transaction, status: BlockStatus) -> BlockId {
        let block_id = BlockId::digest_of(tx.id().as_str().as_bytes());
        {
            let mut spent = self.spent.lock();
            for link in tx.inputs().iter().filter_map(|input| input.fulfills.clone()) {
                spent.entry(link).or_insert_with(|| tx.id().clone());
            }
        }
        self.transactions.write().insert(
            tx.id().clone(),
            CommittedTransaction {
                transaction: tx,
                block_id: Some(block_id.clone()),
                block_status: status,
            },
        );
        block_id
    }

    pub fn set_block_status(&self, tx_id: &TxId, status: BlockStatus) {
        if let Some(committed) = self.transactions.write().get_mut(tx_id) {
            committed.block_status = status;
        }
    }

    pub fn clear_spent(&self) {
        self.spent.lock().clear();
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call, to exercise timeouts.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    async fn gate(&self) -> Result<(), StoreError> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("mock store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MockTransactionStore {
    async fn get_transaction(&self, id: &TxId) -> Result<Option<CommittedTransaction>, StoreError> {
        self.gate().await?;
        Ok(self.transactions.read().get(id).cloned())
    }

    async fn get_output(&self, link: &OutputRef) -> Result<Option<Output>, StoreError> {
        self.gate().await?;
        Ok(self.transactions.read().get(&link.tx_id).and_then(|committed| {
            committed
                .transaction
                .outputs()
                .get(link.output_index as usize)
                .cloned()
        }))
    }

    async fn spent_by(&self, link: &OutputRef) -> Result<Option<TxId>, StoreError> {
        self.gate().await?;
        Ok(self.spent.lock().get(link).cloned())
    }

    async fn mark_spent(
        &self,
        link: &OutputRef,
        spender: &TxId,
    ) -> Result<SpendOutcome, StoreError> {
        self.gate().await?;
        let mut spent = self.spent.lock();
        Ok(match spent.entry(link.clone()) {
            Entry::Occupied(holder) if holder.get() == spender => SpendOutcome::AlreadyClaimed,
            Entry::Occupied(holder) => SpendOutcome::Conflict {
                spent_by: holder.get().clone(),
            },
            Entry::Vacant(slot) => {
                slot.insert(spender.clone());
                SpendOutcome::Claimed
            }
        })
    }

    async fn release_spent(&self, link: &OutputRef, spender: &TxId) -> Result<(), StoreError> {
        self.gate().await?;
        let mut spent = self.spent.lock();
        if spent.get(link) == Some(spender) {
            spent.remove(link);
        }
        Ok(())
    }
}
