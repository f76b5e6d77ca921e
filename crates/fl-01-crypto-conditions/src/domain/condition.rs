//! # Conditions
//!
//! The lock placed on a transaction output. A condition is a tree whose
//! leaves name Ed25519 public keys and whose inner nodes are weighted
//! thresholds. Its `uri` is a fingerprint over a fixed binary encoding of the
//! tree, so two nodes holding the same tree always agree on the fingerprint.

use crate::domain::errors::ConditionError;
use serde::{Deserialize, Serialize};
use shared_crypto::PublicKey;
use shared_types::sha3_256_hex;

/// Type tag of a single-key condition.
pub const ED25519_TYPE: &str = "ed25519-sha-256";
/// Type tag of a weighted threshold condition.
pub const THRESHOLD_TYPE: &str = "threshold-sha-256";
/// Verification cost of one Ed25519 leaf.
pub const ED25519_COST: u64 = 131_072;
/// Per-child overhead added by a threshold node.
const THRESHOLD_CHILD_COST: u64 = 1_024;

/// Structure of a condition, without signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConditionDetails {
    #[serde(rename = "ed25519-sha-256")]
    Ed25519 { public_key: PublicKey },
    #[serde(rename = "threshold-sha-256")]
    Threshold {
        threshold: u32,
        subconditions: Vec<WeightedDetails>,
    },
}

/// A sub-condition together with the weight it contributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedDetails {
    pub weight: u32,
    pub condition: ConditionDetails,
}

impl ConditionDetails {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConditionDetails::Ed25519 { .. } => ED25519_TYPE,
            ConditionDetails::Threshold { .. } => THRESHOLD_TYPE,
        }
    }

    /// Structural check: thresholds reachable, weights positive, no empty nodes.
    pub fn validate(&self) -> Result<(), ConditionError> {
        match self {
            ConditionDetails::Ed25519 { .. } => Ok(()),
            ConditionDetails::Threshold {
                threshold,
                subconditions,
            } => {
                if subconditions.is_empty() {
                    return Err(ConditionError::EmptyThreshold);
                }
                let mut total_weight = 0u64;
                for sub in subconditions {
                    if sub.weight == 0 {
                        return Err(ConditionError::ZeroWeight);
                    }
                    total_weight += u64::from(sub.weight);
                    sub.condition.validate()?;
                }
                if *threshold == 0 || u64::from(*threshold) > total_weight {
                    return Err(ConditionError::InvalidThreshold {
                        threshold: *threshold,
                        total_weight,
                    });
                }
                Ok(())
            }
        }
    }

    /// Verification cost of the whole tree.
    pub fn cost(&self) -> u64 {
        match self {
            ConditionDetails::Ed25519 { .. } => ED25519_COST,
            ConditionDetails::Threshold { subconditions, .. } => subconditions
                .iter()
                .map(|sub| sub.condition.cost().saturating_add(THRESHOLD_CHILD_COST))
                .fold(0u64, u64::saturating_add),
        }
    }

    /// Leaf keys in depth-first order (duplicates preserved).
    pub fn public_keys(&self) -> Vec<PublicKey> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys(&self, out: &mut Vec<PublicKey>) {
        match self {
            ConditionDetails::Ed25519 { public_key } => out.push(*public_key),
            ConditionDetails::Threshold { subconditions, .. } => {
                for sub in subconditions {
                    sub.condition.collect_keys(out);
                }
            }
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.type_name().as_bytes());
        match self {
            ConditionDetails::Ed25519 { public_key } => {
                out.extend_from_slice(public_key.as_bytes());
            }
            ConditionDetails::Threshold {
                threshold,
                subconditions,
            } => {
                out.extend_from_slice(&threshold.to_be_bytes());
                out.extend_from_slice(&(subconditions.len() as u32).to_be_bytes());
                for sub in subconditions {
                    out.extend_from_slice(&sub.weight.to_be_bytes());
                    sub.condition.encode_into(out);
                }
            }
        }
    }

    /// Fingerprint uri: `cc:<type>:<sha3-256 hex>:<cost>`.
    pub fn fingerprint_uri(&self) -> String {
        let mut encoded = Vec::with_capacity(64);
        self.encode_into(&mut encoded);
        format!(
            "cc:{}:{}:{}",
            self.type_name(),
            sha3_256_hex(&encoded),
            self.cost()
        )
    }
}

/// A condition: its structure plus the derived fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition")]
pub struct Condition {
    details: ConditionDetails,
    uri: String,
}

#[derive(Deserialize)]
struct RawCondition {
    details: ConditionDetails,
    uri: String,
}

impl TryFrom<RawCondition> for Condition {
    type Error = ConditionError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        let condition = Condition::from_details(raw.details)?;
        if condition.uri != raw.uri {
            return Err(ConditionError::UriMismatch {
                declared: raw.uri,
                derived: condition.uri,
            });
        }
        Ok(condition)
    }
}

impl Condition {
    /// Build a condition from a validated structure.
    pub fn from_details(details: ConditionDetails) -> Result<Self, ConditionError> {
        details.validate()?;
        Ok(Self::derive(details))
    }

    /// Single-key condition.
    pub fn ed25519(public_key: PublicKey) -> Self {
        Self::derive(ConditionDetails::Ed25519 { public_key })
    }

    /// Fingerprint without structural validation; used when re-deriving the
    /// condition a (possibly hostile) fulfillment claims to satisfy.
    pub(crate) fn derive(details: ConditionDetails) -> Self {
        let uri = details.fingerprint_uri();
        Self { details, uri }
    }

    pub fn details(&self) -> &ConditionDetails {
        &self.details
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn type_name(&self) -> &'static str {
        self.details.type_name()
    }

    pub fn cost(&self) -> u64 {
        self.details.cost()
    }

    /// Keys that may sign for this condition.
    pub fn public_keys(&self) -> Vec<PublicKey> {
        self.details.public_keys()
    }

    /// Number of direct sub-condition slots (0 for a single-key condition).
    pub fn subcondition_count(&self) -> usize {
        match &self.details {
            ConditionDetails::Ed25519 { .. } => 0,
            ConditionDetails::Threshold { subconditions, .. } => subconditions.len(),
        }
    }
}

/// Explicit threshold and per-key weights for `make_condition`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThresholdPolicy {
    pub threshold: u32,
    pub weights: Vec<u32>,
}

/// Build a condition from one or more public keys.
///
/// Without a policy a single key yields an Ed25519 condition and several keys
/// yield an n-of-n threshold with unit weights. With a policy the result is
/// always a threshold node using the supplied weights.
pub fn make_condition(
    public_keys: &[PublicKey],
    policy: Option<&ThresholdPolicy>,
) -> Result<Condition, ConditionError> {
    if public_keys.is_empty() {
        return Err(ConditionError::NoPublicKeys);
    }

    let (threshold, weights) = match policy {
        None if public_keys.len() == 1 => return Ok(Condition::ed25519(public_keys[0])),
        None => (public_keys.len() as u32, vec![1u32; public_keys.len()]),
        Some(policy) => {
            if policy.weights.len() != public_keys.len() {
                return Err(ConditionError::WeightCountMismatch {
                    keys: public_keys.len(),
                    weights: policy.weights.len(),
                });
            }
            (policy.threshold, policy.weights.clone())
        }
    };

    let subconditions = public_keys
        .iter()
        .zip(weights)
        .map(|(public_key, weight)| WeightedDetails {
            weight,
            condition: ConditionDetails::Ed25519 {
                public_key: *public_key,
            },
        })
        .collect();

    Condition::from_details(ConditionDetails::Threshold {
        threshold,
        subconditions,
    })
}
