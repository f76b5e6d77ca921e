//! Transaction inputs (fulfillments) and outputs (conditions).

use crate::domain::errors::{ModelError, ModelResult};
use fl_01_crypto_conditions::{make_condition, Condition, Fulfillment};
use serde::{Deserialize, Serialize};
use shared_crypto::PublicKey;
use shared_types::OutputRef;

/// An output slot: an amount locked by a condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Output {
    pub amount: u64,
    pub condition: Condition,
    /// Owners after this transaction (the condition's leaf keys).
    pub public_keys: Vec<PublicKey>,
}

impl Output {
    /// Lock `amount` to `owners`; several owners produce an n-of-n threshold.
    pub fn generate(owners: &[PublicKey], amount: u64) -> ModelResult<Self> {
        if amount == 0 {
            return Err(ModelError::NonPositiveAmount { index: 0 });
        }
        let condition = make_condition(owners, None)?;
        Ok(Self {
            amount,
            public_keys: owners.to_vec(),
            condition,
        })
    }
}

/// An input: proof that unlocks an earlier output (or, for CREATE and
/// GENESIS, the issuers' authorization).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    /// Keys expected to sign, in order.
    pub owners_before: Vec<PublicKey>,
    pub fulfillment: Fulfillment,
    /// Output being spent; `None` for CREATE and GENESIS.
    pub fulfills: Option<OutputRef>,
}

impl Input {
    /// Unsigned input whose fulfillment skeleton mirrors `condition`.
    pub fn for_condition(
        condition: &Condition,
        owners_before: Vec<PublicKey>,
        fulfills: Option<OutputRef>,
    ) -> Self {
        Self {
            owners_before,
            fulfillment: Fulfillment::from_condition(condition),
            fulfills,
        }
    }

    /// Self-authorizing input for the given issuers.
    pub fn issuance(issuers: &[PublicKey]) -> ModelResult<Self> {
        if issuers.is_empty() {
            return Err(ModelError::NoIssuers);
        }
        let condition = make_condition(issuers, None)?;
        Ok(Self::for_condition(&condition, issuers.to_vec(), None))
    }
}
