//! # Fulfillments
//!
//! Proof that unlocks a condition. A fulfillment mirrors the condition tree
//! and carries an optional signature at every Ed25519 leaf, so a partially
//! signed fulfillment can be handed from co-owner to co-owner until the
//! threshold is reached.

use crate::domain::condition::{Condition, ConditionDetails, WeightedDetails};
use crate::domain::errors::ConditionError;
use serde::{Deserialize, Serialize};
use shared_crypto::{Keypair, PublicKey, Signature};

/// A (possibly partially) signed fulfillment tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Fulfillment {
    #[serde(rename = "ed25519-sha-256")]
    Ed25519 {
        public_key: PublicKey,
        signature: Option<Signature>,
    },
    #[serde(rename = "threshold-sha-256")]
    Threshold {
        threshold: u32,
        subfulfillments: Vec<WeightedFulfillment>,
    },
}

/// A sub-fulfillment together with the weight it contributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedFulfillment {
    pub weight: u32,
    pub fulfillment: Fulfillment,
}

impl Fulfillment {
    /// Unsigned skeleton matching the condition's structure.
    pub fn from_condition(condition: &Condition) -> Self {
        Self::from_details(condition.details())
    }

    fn from_details(details: &ConditionDetails) -> Self {
        match details {
            ConditionDetails::Ed25519 { public_key } => Fulfillment::Ed25519 {
                public_key: *public_key,
                signature: None,
            },
            ConditionDetails::Threshold {
                threshold,
                subconditions,
            } => Fulfillment::Threshold {
                threshold: *threshold,
                subfulfillments: subconditions
                    .iter()
                    .map(|sub| WeightedFulfillment {
                        weight: sub.weight,
                        fulfillment: Self::from_details(&sub.condition),
                    })
                    .collect(),
            },
        }
    }

    fn details(&self) -> ConditionDetails {
        match self {
            Fulfillment::Ed25519 { public_key, .. } => ConditionDetails::Ed25519 {
                public_key: *public_key,
            },
            Fulfillment::Threshold {
                threshold,
                subfulfillments,
            } => ConditionDetails::Threshold {
                threshold: *threshold,
                subconditions: subfulfillments
                    .iter()
                    .map(|sub| WeightedDetails {
                        weight: sub.weight,
                        condition: sub.fulfillment.details(),
                    })
                    .collect(),
            },
        }
    }

    /// The condition this fulfillment claims to satisfy.
    pub fn condition(&self) -> Condition {
        Condition::derive(self.details())
    }

    /// Return a copy with a signature over `message` added at every leaf
    /// owned by one of `keys`. Existing signatures are kept.
    ///
    /// # Errors
    /// `KeypairMismatch` if some key owns no leaf of this fulfillment.
    pub fn co_sign(&self, message: &[u8], keys: &[Keypair]) -> Result<Self, ConditionError> {
        let mut signed = self.clone();
        for keypair in keys {
            let public_key = keypair.public_key();
            let signature = keypair.sign(message);
            if signed.attach(&public_key, signature) == 0 {
                return Err(ConditionError::KeypairMismatch(public_key));
            }
        }
        Ok(signed)
    }

    fn attach(&mut self, signer: &PublicKey, new_signature: Signature) -> usize {
        match self {
            Fulfillment::Ed25519 {
                public_key,
                signature,
            } => {
                if public_key == signer {
                    *signature = Some(new_signature);
                    1
                } else {
                    0
                }
            }
            Fulfillment::Threshold {
                subfulfillments, ..
            } => subfulfillments
                .iter_mut()
                .map(|sub| sub.fulfillment.attach(signer, new_signature))
                .sum(),
        }
    }

    /// Leaf keys in depth-first order.
    pub fn public_keys(&self) -> Vec<PublicKey> {
        self.details().public_keys()
    }

    /// Number of signatures embedded anywhere in the tree.
    pub fn signature_count(&self) -> usize {
        match self {
            Fulfillment::Ed25519 { signature, .. } => usize::from(signature.is_some()),
            Fulfillment::Threshold {
                subfulfillments, ..
            } => subfulfillments
                .iter()
                .map(|sub| sub.fulfillment.signature_count())
                .sum(),
        }
    }

    /// Whether enough leaves carry a signature to reach every threshold.
    /// Signatures are not checked here; see [`verify`].
    pub fn is_fully_signed(&self) -> bool {
        match self {
            Fulfillment::Ed25519 { signature, .. } => signature.is_some(),
            Fulfillment::Threshold {
                threshold,
                subfulfillments,
            } => {
                let reached: u64 = subfulfillments
                    .iter()
                    .filter(|sub| sub.fulfillment.is_fully_signed())
                    .map(|sub| u64::from(sub.weight))
                    .sum();
                *threshold > 0 && reached >= u64::from(*threshold)
            }
        }
    }

    fn embedded_signatures_valid(&self, message: &[u8]) -> bool {
        match self {
            Fulfillment::Ed25519 {
                public_key,
                signature,
            } => match signature {
                Some(signature) => public_key.verify(message, signature).is_ok(),
                None => true,
            },
            Fulfillment::Threshold {
                subfulfillments, ..
            } => subfulfillments
                .iter()
                .all(|sub| sub.fulfillment.embedded_signatures_valid(message)),
        }
    }
}

/// Produce a fulfillment for `condition` signed by `keys` over `message`.
///
/// Keys that own no leaf fail with `KeypairMismatch`. Supplying only some of
/// the keys of a threshold yields a partial fulfillment that will not verify
/// until co-signed.
pub fn fulfill(
    condition: &Condition,
    message: &[u8],
    keys: &[Keypair],
) -> Result<Fulfillment, ConditionError> {
    Fulfillment::from_condition(condition).co_sign(message, keys)
}

/// True iff the fulfillment matches `condition` exactly, every embedded
/// signature verifies over `message`, and the signed leaves satisfy every
/// threshold on the way to the root.
pub fn verify(fulfillment: &Fulfillment, condition: &Condition, message: &[u8]) -> bool {
    if condition.details().validate().is_err() {
        return false;
    }
    if fulfillment.condition() != *condition {
        return false;
    }
    fulfillment.is_fully_signed() && fulfillment.embedded_signatures_valid(message)
}
