//! Shared builders for the integration flows.

use fl_02_ledger_model::{now_millis, Asset, Block, BlockStatus, Transaction};
use fl_03_validation::{StoreError, ValidationConfig, ValidationPipeline};
use fl_05_chain_recovery::ChainStore;
use node_runtime::{InMemoryLedgerStore, LedgerStore};
use parking_lot::Mutex;
use shared_crypto::{Keypair, PublicKey};
use std::sync::Arc;

/// Signed CREATE of an indivisible asset owned by `owner`.
pub fn create(owner: &Keypair) -> Transaction {
    Transaction::create(&[owner.public_key()], vec![(vec![owner.public_key()], 1)], None)
        .and_then(|tx| tx.sign(std::slice::from_ref(owner)))
        .expect("create")
}

/// Signed CREATE of a divisible asset, one output per amount, all owned by
/// `owner`.
pub fn create_divisible(owner: &Keypair, amounts: &[u64]) -> Transaction {
    let asset = Asset::new(Some(serde_json::json!({ "unit": "token" })), true).expect("asset");
    let outputs = amounts
        .iter()
        .map(|&amount| (vec![owner.public_key()], amount))
        .collect();
    Transaction::create(&[owner.public_key()], outputs, Some(asset))
        .and_then(|tx| tx.sign(std::slice::from_ref(owner)))
        .expect("create")
}

/// TRANSFER of the given outputs of `source`, signed by `signers`.
pub fn transfer(
    source: &Transaction,
    indices: &[u32],
    signers: &[Keypair],
    outputs: Vec<(Vec<PublicKey>, u64)>,
) -> Transaction {
    let inputs = source.spendable_inputs(indices).expect("inputs");
    Transaction::transfer(inputs, outputs, source.asset_id().clone())
        .and_then(|tx| tx.sign(signers))
        .expect("transfer")
}

/// A store seeded with a genesis block, plus a pipeline over it.
pub struct Ledger {
    pub node: Keypair,
    pub store: Arc<InMemoryLedgerStore>,
    pub pipeline: Arc<ValidationPipeline>,
    tip: Mutex<Block>,
}

impl Ledger {
    pub async fn new() -> Self {
        let node = Keypair::generate();
        let store = Arc::new(InMemoryLedgerStore::new());
        let genesis = Block::genesis(Transaction::genesis(&node).expect("genesis tx"), &node)
            .expect("genesis block");
        store.insert_genesis_block(&genesis).await.expect("insert genesis");
        let pipeline = Arc::new(ValidationPipeline::new(
            store.clone(),
            ValidationConfig::default(),
        ));
        Self {
            node,
            store,
            pipeline,
            tip: Mutex::new(genesis),
        }
    }

    /// Append a block holding `txs` and settle it with `status`.
    pub async fn commit(
        &self,
        txs: Vec<Transaction>,
        status: BlockStatus,
    ) -> Result<Block, StoreError> {
        let (height, previous) = {
            let tip = self.tip.lock();
            (tip.height() + 1, tip.id().clone())
        };
        let block = Block::new(height, Some(previous), txs, self.node.public_key(), now_millis())
            .and_then(|block| block.sign(&self.node))
            .expect("block");
        self.store.write_block(&block).await?;
        self.store.set_block_status(block.id(), status).await?;
        *self.tip.lock() = block.clone();
        Ok(block)
    }
}
