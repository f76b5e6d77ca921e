//! Federation votes on block validity.

use crate::domain::errors::ModelResult;
use serde::{Deserialize, Serialize};
use shared_crypto::{Keypair, PublicKey, Signature};
use shared_types::{canonical_json, BlockId};

/// The opinion being signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBody {
    pub voting_for_block: BlockId,
    /// Block the voter considers the predecessor.
    pub previous_block: Option<BlockId>,
    pub is_block_valid: bool,
    pub invalid_reason: Option<String>,
    pub timestamp: u64,
}

#[derive(Serialize)]
struct VotePayload<'a> {
    node_pubkey: &'a PublicKey,
    vote: &'a VoteBody,
}

/// A signed vote. The signature covers the canonical encoding of the
/// voter key together with the body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub node_pubkey: PublicKey,
    pub vote: VoteBody,
    pub signature: Signature,
}

impl Vote {
    pub fn sign(body: VoteBody, keypair: &Keypair) -> ModelResult<Self> {
        let node_pubkey = keypair.public_key();
        let payload = Self::payload(&node_pubkey, &body)?;
        Ok(Self {
            signature: keypair.sign(payload.as_bytes()),
            node_pubkey,
            vote: body,
        })
    }

    fn payload(node_pubkey: &PublicKey, vote: &VoteBody) -> ModelResult<String> {
        Ok(canonical_json(&VotePayload { node_pubkey, vote })?)
    }

    /// Whether the signature verifies against the declared voter key.
    /// Keyring membership is a consensus concern.
    pub fn verify_signature(&self) -> bool {
        match Self::payload(&self.node_pubkey, &self.vote) {
            Ok(payload) => self
                .node_pubkey
                .verify(payload.as_bytes(), &self.signature)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub fn block_id(&self) -> &BlockId {
        &self.vote.voting_for_block
    }

    pub fn is_valid_verdict(&self) -> bool {
        self.vote.is_block_valid
    }
}
