//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of the crypto-condition engine.

use crate::domain::condition::{Condition, ThresholdPolicy};
use crate::domain::errors::ConditionError;
use crate::domain::fulfillment::Fulfillment;
use shared_crypto::{Keypair, PublicKey};

/// One fulfillment to check against one condition and message.
#[derive(Clone, Debug)]
pub struct VerificationItem {
    pub fulfillment: Fulfillment,
    pub condition: Condition,
    pub message: Vec<u8>,
}

/// Result of batch verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchVerificationResult {
    /// Individual verdicts, in request order
    pub results: Vec<bool>,
    /// Whether all verifications passed
    pub all_valid: bool,
    /// Count of valid fulfillments
    pub valid_count: usize,
    /// Count of invalid fulfillments
    pub invalid_count: usize,
}

impl BatchVerificationResult {
    /// Create a batch result from individual verdicts.
    pub fn from_results(results: Vec<bool>) -> Self {
        let valid_count = results.iter().filter(|valid| **valid).count();
        let invalid_count = results.len() - valid_count;

        Self {
            results,
            all_valid: invalid_count == 0,
            valid_count,
            invalid_count,
        }
    }

    /// Indices of the items that failed.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, valid)| !**valid)
            .map(|(index, _)| index)
            .collect()
    }
}

/// Crypto-condition API.
///
/// Implementations must be thread-safe (`Send + Sync`); verification holds
/// no state and may run on any number of threads at once.
pub trait ConditionApi: Send + Sync {
    /// Build a single-key or weighted-threshold condition.
    fn make_condition(
        &self,
        public_keys: &[PublicKey],
        policy: Option<&ThresholdPolicy>,
    ) -> Result<Condition, ConditionError>;

    /// Sign `message` for `condition` with every supplied key.
    fn fulfill(
        &self,
        condition: &Condition,
        message: &[u8],
        keys: &[Keypair],
    ) -> Result<Fulfillment, ConditionError>;

    /// Check one fulfillment. Never errors; malformed input is `false`.
    fn verify(&self, fulfillment: &Fulfillment, condition: &Condition, message: &[u8]) -> bool;

    /// Check many fulfillments in parallel.
    fn verify_batch(&self, items: &[VerificationItem]) -> BatchVerificationResult;
}
