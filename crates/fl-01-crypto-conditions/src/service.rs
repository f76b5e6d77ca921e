//! # Condition Service
//!
//! Application service implementing `ConditionApi` over the domain layer.
//! Batch verification fans out across the rayon pool; every item is
//! independent and pure.

use crate::domain::condition::{self as conditions, Condition, ThresholdPolicy};
use crate::domain::errors::ConditionError;
use crate::domain::fulfillment::{self as fulfillments, Fulfillment};
use crate::ports::inbound::{BatchVerificationResult, ConditionApi, VerificationItem};
use rayon::prelude::*;
use shared_crypto::{Keypair, PublicKey};
use tracing::trace;

/// Stateless crypto-condition service.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConditionService;

impl ConditionService {
    pub fn new() -> Self {
        Self
    }
}

impl ConditionApi for ConditionService {
    fn make_condition(
        &self,
        public_keys: &[PublicKey],
        policy: Option<&ThresholdPolicy>,
    ) -> Result<Condition, ConditionError> {
        conditions::make_condition(public_keys, policy)
    }

    fn fulfill(
        &self,
        condition: &Condition,
        message: &[u8],
        keys: &[Keypair],
    ) -> Result<Fulfillment, ConditionError> {
        fulfillments::fulfill(condition, message, keys)
    }

    fn verify(&self, fulfillment: &Fulfillment, condition: &Condition, message: &[u8]) -> bool {
        fulfillments::verify(fulfillment, condition, message)
    }

    fn verify_batch(&self, items: &[VerificationItem]) -> BatchVerificationResult {
        let results: Vec<bool> = items
            .par_iter()
            .map(|item| fulfillments::verify(&item.fulfillment, &item.condition, &item.message))
            .collect();

        let batch = BatchVerificationResult::from_results(results);
        trace!(
            total = items.len(),
            invalid = batch.invalid_count,
            "batch condition verification finished"
        );
        batch
    }
}
