//! # Validation Service
//!
//! `ValidationPipeline` implements [`TransactionValidator`] over an abstract
//! [`TransactionStore`]. It holds no per-transaction state, so one pipeline
//! may serve any number of concurrent validations.

use crate::domain::config::ValidationConfig;
use crate::domain::errors::{ValidationError, ValidationResult};
use crate::domain::verdict::{ValidatedTransaction, ValidationMode};
use crate::ports::inbound::TransactionValidator;
use crate::ports::outbound::{CommittedTransaction, SpendOutcome, StoreError, TransactionStore};
use async_trait::async_trait;
use fl_01_crypto_conditions::{ConditionApi, ConditionService, VerificationItem};
use fl_02_ledger_model::{ModelError, Output, Transaction, TransactionKind};
use shared_types::{OutputRef, TxId};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A TRANSFER input joined with the output it spends.
struct ResolvedInput {
    link: OutputRef,
    output: Output,
    asset_id: TxId,
}

pub struct ValidationPipeline {
    store: Arc<dyn TransactionStore>,
    conditions: ConditionService,
    config: ValidationConfig,
}

impl ValidationPipeline {
    pub fn new(store: Arc<dyn TransactionStore>, config: ValidationConfig) -> Self {
        Self {
            store,
            conditions: ConditionService::new(),
            config,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `tx` in the given mode and log the outcome.
    pub async fn run(
        &self,
        tx: &Transaction,
        mode: ValidationMode,
    ) -> ValidationResult<ValidatedTransaction> {
        let outcome = self.evaluate(tx, mode).await;
        match &outcome {
            Ok(verdict) => debug!(
                tx_id = %tx.id(),
                operation = tx.operation().as_str(),
                spent = verdict.spent.len(),
                ?mode,
                "transaction accepted"
            ),
            Err(err) if err.is_double_spend() => {
                info!(tx_id = %tx.id(), error = %err, "transaction lost spend race")
            }
            Err(err) if err.is_transient() => {
                warn!(tx_id = %tx.id(), error = %err, "transient validation failure")
            }
            Err(err) => debug!(
                tx_id = %tx.id(),
                class = ?err.class(),
                error = %err,
                "transaction rejected"
            ),
        }
        outcome
    }

    async fn evaluate(
        &self,
        tx: &Transaction,
        mode: ValidationMode,
    ) -> ValidationResult<ValidatedTransaction> {
        // Phase A
        tx.validate_structure()?;

        // Phase B
        let spent = match tx.kind() {
            TransactionKind::Genesis { .. } => return Err(ValidationError::GenesisNotAllowed),
            TransactionKind::Create { .. } => {
                self.check_not_committed(tx).await?;
                self.check_issuance(tx)?;
                self.check_hash(tx)?;
                Vec::new()
            }
            TransactionKind::Transfer { .. } => {
                self.check_not_committed(tx).await?;
                self.check_transfer(tx, mode).await?
            }
        };

        Ok(ValidatedTransaction {
            tx_id: tx.id().clone(),
            operation: tx.operation(),
            spent,
            mode,
        })
    }

    async fn check_not_committed(&self, tx: &Transaction) -> ValidationResult<()> {
        match self.call(self.store.get_transaction(tx.id())).await? {
            Some(committed) if committed.in_valid_block() => {
                Err(ValidationError::DuplicateTransaction(tx.id().clone()))
            }
            _ => Ok(()),
        }
    }

    /// Issuers must have signed the canonical n-of-n condition over their
    /// own keys.
    fn check_issuance(&self, tx: &Transaction) -> ValidationResult<()> {
        let messages = tx.signing_messages()?;
        let items = tx
            .inputs()
            .iter()
            .zip(messages)
            .map(|(input, message)| {
                let condition = self
                    .conditions
                    .make_condition(&input.owners_before, None)
                    .map_err(ModelError::from)?;
                Ok(VerificationItem {
                    fulfillment: input.fulfillment.clone(),
                    condition,
                    message: message.to_vec(),
                })
            })
            .collect::<ValidationResult<Vec<_>>>()?;
        self.verify_fulfillments(&items)
    }

    async fn check_transfer(
        &self,
        tx: &Transaction,
        mode: ValidationMode,
    ) -> ValidationResult<Vec<OutputRef>> {
        let mut resolved = Vec::with_capacity(tx.inputs().len());
        for (index, input) in tx.inputs().iter().enumerate() {
            let link = input
                .fulfills
                .clone()
                .ok_or(ModelError::MissingFulfills { index })?;

            // 1. Existence
            let source = self
                .call(self.store.get_transaction(&link.tx_id))
                .await?
                .filter(CommittedTransaction::in_valid_block)
                .ok_or_else(|| ValidationError::InputNotInValidBlock(link.clone()))?;
            let output = self
                .call(self.store.get_output(&link))
                .await?
                .ok_or_else(|| ValidationError::OutputNotFound(link.clone()))?;

            // 2. Double-spend, against committed claims
            if let Some(spent_by) = self.call(self.store.spent_by(&link)).await? {
                if &spent_by != tx.id() {
                    return Err(ValidationError::DoubleSpend {
                        output: link,
                        spent_by,
                    });
                }
            }

            resolved.push(ResolvedInput {
                link,
                output,
                asset_id: source.transaction.asset_id().clone(),
            });
        }

        // 3. Fulfillments
        let messages = tx.signing_messages()?;
        let items: Vec<VerificationItem> = tx
            .inputs()
            .iter()
            .zip(&resolved)
            .zip(messages)
            .map(|((input, source), message)| VerificationItem {
                fulfillment: input.fulfillment.clone(),
                condition: source.output.condition.clone(),
                message: message.to_vec(),
            })
            .collect();
        self.verify_fulfillments(&items)?;

        // 4. Amount conservation
        let asset_id = tx.asset_id();
        let minted = self
            .call(self.store.get_transaction(asset_id))
            .await?
            .ok_or_else(|| ValidationError::AssetNotFound(asset_id.clone()))?;
        let asset = minted
            .transaction
            .asset()
            .ok_or_else(|| ValidationError::AssetNotFound(asset_id.clone()))?;
        if !asset.divisible {
            let amounts = resolved
                .iter()
                .map(|source| source.output.amount)
                .chain(tx.outputs().iter().map(|output| output.amount));
            for amount in amounts {
                if amount != 1 {
                    return Err(ValidationError::IndivisibleAmount {
                        asset_id: asset_id.clone(),
                        amount,
                    });
                }
            }
        }
        let inputs = resolved
            .iter()
            .try_fold(0u64, |total, source| total.checked_add(source.output.amount))
            .ok_or_else(|| ModelError::Amount("input amounts overflow".into()))?;
        let outputs = tx.total_output_amount()?;
        if inputs != outputs {
            return Err(ValidationError::AmountMismatch { inputs, outputs });
        }

        // 5. Asset identity
        if let Some(stray) = resolved.iter().find(|source| &source.asset_id != asset_id) {
            return Err(ValidationError::AssetIdMismatch {
                expected: asset_id.clone(),
                found: stray.asset_id.clone(),
            });
        }

        // 6. Hash integrity
        self.check_hash(tx)?;

        let mut spent: Vec<OutputRef> = resolved.into_iter().map(|source| source.link).collect();
        spent.sort();
        if mode == ValidationMode::Commit {
            self.claim(tx.id(), &spent).await?;
        }
        Ok(spent)
    }

    fn verify_fulfillments(&self, items: &[VerificationItem]) -> ValidationResult<()> {
        let batch = self.conditions.verify_batch(items);
        match batch.failed_indices().first() {
            Some(&index) => Err(ValidationError::InvalidSignature { index }),
            None => Ok(()),
        }
    }

    fn check_hash(&self, tx: &Transaction) -> ValidationResult<()> {
        let computed = tx.recompute_id()?;
        if &computed != tx.id() {
            return Err(ValidationError::HashMismatch {
                declared: tx.id().clone(),
                computed,
            });
        }
        Ok(())
    }

    /// Claim every link for `spender`, in order. A lost claim releases the
    /// ones taken so far.
    async fn claim(&self, spender: &TxId, links: &[OutputRef]) -> ValidationResult<()> {
        let mut held: Vec<&OutputRef> = Vec::with_capacity(links.len());
        for link in links {
            match self.call(self.store.mark_spent(link, spender)).await {
                Ok(SpendOutcome::Claimed) => held.push(link),
                Ok(SpendOutcome::AlreadyClaimed) => {}
                Ok(SpendOutcome::Conflict { spent_by }) => {
                    self.release(spender, &held).await;
                    return Err(ValidationError::DoubleSpend {
                        output: link.clone(),
                        spent_by,
                    });
                }
                Err(err) => {
                    // the claim may have landed before the call timed out
                    held.push(link);
                    self.release(spender, &held).await;
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    async fn release(&self, spender: &TxId, links: &[&OutputRef]) {
        for link in links {
            if let Err(err) = self.call(self.store.release_spent(link, spender)).await {
                warn!(output = %link, spender = %spender, error = %err, "failed to release spend claim");
            }
        }
    }

    /// Bound a store call by the configured timeout.
    async fn call<T>(
        &self,
        pending: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.config.store_timeout, pending).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.config.store_timeout)),
        }
    }
}

#[async_trait]
impl TransactionValidator for ValidationPipeline {
    async fn validate(&self, tx: &Transaction) -> ValidationResult<ValidatedTransaction> {
        self.run(tx, ValidationMode::Commit).await
    }

    async fn dry_run(&self, tx: &Transaction) -> ValidationResult<ValidatedTransaction> {
        self.run(tx, ValidationMode::DryRun).await
    }
}
