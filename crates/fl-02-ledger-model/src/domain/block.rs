//! Blocks: ordered batches of transactions proposed and signed by one
//! federation node.

use crate::domain::errors::{ModelError, ModelResult};
use crate::domain::transaction::Transaction;
use serde::{Deserialize, Serialize};
use shared_crypto::{Keypair, PublicKey, Signature};
use shared_types::{canonical_json, BlockId, Height, TxId};
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of the federation vote on a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    #[default]
    Undecided,
    Valid,
    Invalid,
}

impl BlockStatus {
    /// VALID and INVALID never change once reached.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BlockStatus::Undecided)
    }
}

/// Hashed part of a block. Transactions enter by id only.
#[derive(Serialize)]
struct BlockHeader<'a> {
    height: Height,
    previous_block: Option<&'a BlockId>,
    timestamp: u64,
    node_pubkey: &'a PublicKey,
    transactions: Vec<&'a TxId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    height: Height,
    previous_block: Option<BlockId>,
    timestamp: u64,
    node_pubkey: PublicKey,
    transactions: Vec<Transaction>,
    signature: Option<Signature>,
}

impl Block {
    /// Unsigned block proposed by `node_pubkey`. `timestamp` is in
    /// milliseconds since the Unix epoch.
    pub fn new(
        height: Height,
        previous_block: Option<BlockId>,
        transactions: Vec<Transaction>,
        node_pubkey: PublicKey,
        timestamp: u64,
    ) -> ModelResult<Self> {
        let mut block = Self {
            id: BlockId::digest_of(b""),
            height,
            previous_block,
            timestamp,
            node_pubkey,
            transactions,
            signature: None,
        };
        block.id = block.recompute_id()?;
        Ok(block)
    }

    /// Height-0 block holding only `genesis_tx`.
    pub fn genesis(genesis_tx: Transaction, node: &Keypair) -> ModelResult<Self> {
        Self::new(0, None, vec![genesis_tx], node.public_key(), now_millis())?.sign(node)
    }

    /// Copy signed over the block id. Only the proposing node can sign.
    pub fn sign(&self, keypair: &Keypair) -> ModelResult<Self> {
        if keypair.public_key() != self.node_pubkey {
            return Err(ModelError::KeypairMismatch(keypair.public_key()));
        }
        Ok(Self {
            signature: Some(keypair.sign(self.id.as_str().as_bytes())),
            ..self.clone()
        })
    }

    pub fn verify_signature(&self) -> bool {
        match &self.signature {
            Some(signature) => self
                .node_pubkey
                .verify(self.id.as_str().as_bytes(), signature)
                .is_ok(),
            None => false,
        }
    }

    pub fn recompute_id(&self) -> ModelResult<BlockId> {
        let header = BlockHeader {
            height: self.height,
            previous_block: self.previous_block.as_ref(),
            timestamp: self.timestamp,
            node_pubkey: &self.node_pubkey,
            transactions: self.transactions.iter().map(Transaction::id).collect(),
        };
        Ok(BlockId::digest_of(canonical_json(&header)?.as_bytes()))
    }

    pub fn has_valid_id(&self) -> ModelResult<bool> {
        Ok(self.recompute_id()? == self.id)
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn previous_block(&self) -> Option<&BlockId> {
        self.previous_block.as_ref()
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn node_pubkey(&self) -> &PublicKey {
        &self.node_pubkey
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.previous_block.is_none()
    }
}

/// Milliseconds since the Unix epoch; 0 if the clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
