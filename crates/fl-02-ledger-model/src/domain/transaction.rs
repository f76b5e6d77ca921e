//! # Transactions
//!
//! The atomic unit of state change. Values are immutable: `sign` and
//! `with_metadata` return new transactions, so the pre-sign and post-sign
//! forms can be inspected side by side.

use crate::domain::asset::{json_type_name, Asset, AssetLink};
use crate::domain::errors::{ModelError, ModelResult};
use crate::domain::io::{Input, Output};
use fl_01_crypto_conditions::Fulfillment;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use shared_crypto::{Keypair, PublicKey};
use shared_types::{canonical_json, canonical_value, sha3_256, Hash, OutputRef, TxId};
use std::collections::HashSet;

/// Document version produced and accepted by this node.
pub const TX_VERSION: &str = "1.0";

/// Transaction operation tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Transfer,
    Genesis,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Transfer => "TRANSFER",
            Operation::Genesis => "GENESIS",
        }
    }
}

/// Operation-specific payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Create { asset: Asset },
    Transfer { asset: AssetLink },
    Genesis { asset: Asset },
}

/// Wire form. Loosely typed where the operation decides the shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransactionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    version: String,
    operation: Operation,
    asset: Value,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// A ledger transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransactionDocument", into = "TransactionDocument")]
pub struct Transaction {
    id: TxId,
    version: String,
    kind: TransactionKind,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    metadata: Option<Map<String, Value>>,
}

impl Transaction {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Unsigned CREATE minting `asset` (indivisible and empty by default).
    ///
    /// `outputs` pairs each owner set with its amount.
    pub fn create(
        issuers: &[PublicKey],
        outputs: Vec<(Vec<PublicKey>, u64)>,
        asset: Option<Asset>,
    ) -> ModelResult<Self> {
        let input = Input::issuance(issuers)?;
        let outputs = build_outputs(outputs)?;
        Self::assemble(
            TransactionKind::Create {
                asset: asset.unwrap_or_default(),
            },
            vec![input],
            outputs,
            None,
        )
    }

    /// Unsigned TRANSFER spending `inputs` (see [`Transaction::spendable_inputs`]).
    pub fn transfer(
        inputs: Vec<Input>,
        outputs: Vec<(Vec<PublicKey>, u64)>,
        asset_id: TxId,
    ) -> ModelResult<Self> {
        if inputs.is_empty() {
            return Err(ModelError::NoInputs);
        }
        if let Some(index) = inputs.iter().position(|input| input.fulfills.is_none()) {
            return Err(ModelError::MissingFulfills { index });
        }
        let outputs = build_outputs(outputs)?;
        Self::assemble(
            TransactionKind::Transfer {
                asset: AssetLink { id: asset_id },
            },
            inputs,
            outputs,
            None,
        )
    }

    /// Signed GENESIS transaction issued by and to the node itself.
    pub fn genesis(node: &Keypair) -> ModelResult<Self> {
        let node_key = node.public_key();
        let asset = Asset::new(Some(json!({ "genesis": true })), false)?;
        let unsigned = Self::assemble(
            TransactionKind::Genesis { asset },
            vec![Input::issuance(&[node_key])?],
            vec![Output::generate(&[node_key], 1)?],
            None,
        )?;
        unsigned.sign(std::slice::from_ref(node))
    }

    fn assemble(
        kind: TransactionKind,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
        metadata: Option<Map<String, Value>>,
    ) -> ModelResult<Self> {
        let mut tx = Self {
            id: TxId::digest_of(b""),
            version: TX_VERSION.to_owned(),
            kind,
            inputs,
            outputs,
            metadata,
        };
        tx.id = tx.recompute_id()?;
        Ok(tx)
    }

    /// Copy with `metadata` attached. Changes the signed payload, so attach
    /// metadata before signing.
    pub fn with_metadata(&self, metadata: Option<Value>) -> ModelResult<Self> {
        let mut tx = self.clone();
        tx.metadata = parse_metadata(metadata)?;
        tx.id = tx.recompute_id()?;
        Ok(tx)
    }

    /// Unsigned inputs spending the given outputs of this transaction.
    pub fn spendable_inputs(&self, indices: &[u32]) -> ModelResult<Vec<Input>> {
        indices
            .iter()
            .map(|&index| {
                let output = self.outputs.get(index as usize).ok_or(
                    ModelError::OutputIndexOutOfRange {
                        index,
                        len: self.outputs.len(),
                    },
                )?;
                Ok(Input::for_condition(
                    &output.condition,
                    output.public_keys.clone(),
                    Some(self.output_ref(index)),
                ))
            })
            .collect()
    }

    // =========================================================================
    // Signing
    // =========================================================================

    /// Return a copy with signatures from `keys` added to every input they
    /// own. Signatures already present are kept, so co-owners may sign in
    /// turn.
    ///
    /// # Errors
    /// `KeypairMismatch` if a key owns no leaf of any input.
    pub fn sign(&self, keys: &[Keypair]) -> ModelResult<Self> {
        let messages = self.signing_messages()?;
        let mut used = vec![false; keys.len()];
        let mut inputs = Vec::with_capacity(self.inputs.len());

        for (input, message) in self.inputs.iter().zip(&messages) {
            let owners = input.fulfillment.public_keys();
            let signers: Vec<Keypair> = keys
                .iter()
                .enumerate()
                .filter(|(_, key)| owners.contains(&key.public_key()))
                .map(|(position, key)| {
                    used[position] = true;
                    key.clone()
                })
                .collect();
            inputs.push(Input {
                fulfillment: input.fulfillment.co_sign(message, &signers)?,
                ..input.clone()
            });
        }

        if let Some(position) = used.iter().position(|was_used| !was_used) {
            return Err(ModelError::KeypairMismatch(keys[position].public_key()));
        }

        let mut signed = Self {
            inputs,
            ..self.clone()
        };
        signed.id = signed.recompute_id()?;
        tracing::trace!(tx_id = %signed.id, signers = keys.len(), "transaction signed");
        Ok(signed)
    }

    /// Canonical body with `id` removed and every fulfillment reduced to
    /// its unsigned skeleton.
    fn signing_payload(&self) -> ModelResult<String> {
        let mut stripped = self.clone();
        for input in &mut stripped.inputs {
            input.fulfillment = Fulfillment::from_condition(&input.fulfillment.condition());
        }
        Ok(canonical_json(&stripped.document(false))?)
    }

    /// Message each input signs: the signing payload bound to the output
    /// the input spends.
    pub fn signing_messages(&self) -> ModelResult<Vec<Hash>> {
        let payload = self.signing_payload()?;
        Ok(self
            .inputs
            .iter()
            .map(|input| {
                let mut message = payload.clone().into_bytes();
                if let Some(link) = &input.fulfills {
                    message.extend_from_slice(link.tx_id.as_str().as_bytes());
                    message.extend_from_slice(link.output_index.to_string().as_bytes());
                }
                sha3_256(&message)
            })
            .collect())
    }

    // =========================================================================
    // Identity & Serialization
    // =========================================================================

    fn document(&self, with_id: bool) -> TransactionDocument {
        let asset = match &self.kind {
            TransactionKind::Create { asset } | TransactionKind::Genesis { asset } => json!({
                "data": asset.data.clone().map(Value::Object).unwrap_or(Value::Null),
                "divisible": asset.divisible,
            }),
            TransactionKind::Transfer { asset } => json!({ "id": asset.id.as_str() }),
        };
        TransactionDocument {
            id: with_id.then(|| self.id.to_string()),
            version: self.version.clone(),
            operation: self.operation(),
            asset,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            metadata: self.metadata.clone().map(Value::Object),
        }
    }

    /// Digest of the canonical body without `id`.
    pub fn recompute_id(&self) -> ModelResult<TxId> {
        let body = canonical_json(&self.document(false))?;
        Ok(TxId::digest_of(body.as_bytes()))
    }

    /// Whether the declared id matches the body.
    pub fn has_valid_id(&self) -> ModelResult<bool> {
        Ok(self.recompute_id()? == self.id)
    }

    /// Canonical JSON tree, including `id`.
    pub fn to_dict(&self) -> ModelResult<Value> {
        Ok(canonical_value(&self.document(true))?)
    }

    /// Parse a JSON tree. Types are checked here; semantic rules are left to
    /// [`Transaction::validate_structure`]. The declared id is kept as is.
    pub fn from_dict(value: Value) -> ModelResult<Self> {
        let document: TransactionDocument = serde_json::from_value(value)?;
        Self::try_from(document)
    }

    /// Canonical JSON string, including `id`.
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(canonical_json(&self.document(true))?)
    }

    pub fn from_json(encoded: &str) -> ModelResult<Self> {
        let value: Value = serde_json::from_str(encoded)?;
        Self::from_dict(value)
    }

    // =========================================================================
    // Structural validation
    // =========================================================================

    /// Every rule that needs no store access. A failure here is permanent:
    /// the transaction cannot become valid without modification.
    pub fn validate_structure(&self) -> ModelResult<()> {
        if self.version != TX_VERSION {
            return Err(ModelError::UnsupportedVersion(self.version.clone()));
        }
        if self.outputs.is_empty() {
            return Err(ModelError::NoOutputs);
        }
        for (index, output) in self.outputs.iter().enumerate() {
            if output.amount == 0 {
                return Err(ModelError::NonPositiveAmount { index });
            }
            if output.public_keys.is_empty() {
                return Err(ModelError::EmptyOwners { index });
            }
            if output.public_keys != output.condition.public_keys() {
                return Err(ModelError::ConditionOwnerMismatch { index });
            }
        }
        self.total_output_amount()?;

        match &self.kind {
            TransactionKind::Create { asset } | TransactionKind::Genesis { asset } => {
                if self.inputs.len() != 1 {
                    return Err(ModelError::Schema(format!(
                        "{} must have exactly one input, got {}",
                        self.operation().as_str(),
                        self.inputs.len()
                    )));
                }
                if self.inputs[0].fulfills.is_some() {
                    return Err(ModelError::UnexpectedFulfills {
                        index: 0,
                        operation: self.operation().as_str(),
                    });
                }
                for output in &self.outputs {
                    asset.validate_amount(output.amount)?;
                }
                if !asset.divisible && self.outputs.len() != 1 {
                    return Err(ModelError::Amount(
                        "non divisible assets must be created with exactly one output".into(),
                    ));
                }
            }
            TransactionKind::Transfer { .. } => {
                if self.inputs.is_empty() {
                    return Err(ModelError::NoInputs);
                }
                let mut spent = HashSet::with_capacity(self.inputs.len());
                for (index, input) in self.inputs.iter().enumerate() {
                    let link = input
                        .fulfills
                        .as_ref()
                        .ok_or(ModelError::MissingFulfills { index })?;
                    if !spent.insert(link) {
                        return Err(ModelError::DuplicateInput(link.clone()));
                    }
                }
            }
        }

        for (index, input) in self.inputs.iter().enumerate() {
            if input.owners_before != input.fulfillment.public_keys() {
                return Err(ModelError::OwnerMismatch { index });
            }
            if !input.fulfillment.is_fully_signed() {
                return Err(ModelError::MissingSignature { index });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &TxId {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn operation(&self) -> Operation {
        match self.kind {
            TransactionKind::Create { .. } => Operation::Create,
            TransactionKind::Transfer { .. } => Operation::Transfer,
            TransactionKind::Genesis { .. } => Operation::Genesis,
        }
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    /// Asset definition; only CREATE and GENESIS carry one.
    pub fn asset(&self) -> Option<&Asset> {
        match &self.kind {
            TransactionKind::Create { asset } | TransactionKind::Genesis { asset } => Some(asset),
            TransactionKind::Transfer { .. } => None,
        }
    }

    /// Id shared by every transaction of this asset lineage: the minting
    /// transaction's own id, or the id a TRANSFER links to.
    pub fn asset_id(&self) -> &TxId {
        match &self.kind {
            TransactionKind::Create { .. } | TransactionKind::Genesis { .. } => &self.id,
            TransactionKind::Transfer { asset } => &asset.id,
        }
    }

    pub fn output_ref(&self, index: u32) -> OutputRef {
        OutputRef::new(self.id.clone(), index)
    }

    pub fn total_output_amount(&self) -> ModelResult<u64> {
        self.outputs.iter().try_fold(0u64, |total, output| {
            total
                .checked_add(output.amount)
                .ok_or_else(|| ModelError::Amount("output amounts overflow".into()))
        })
    }
}

fn build_outputs(outputs: Vec<(Vec<PublicKey>, u64)>) -> ModelResult<Vec<Output>> {
    if outputs.is_empty() {
        return Err(ModelError::NoOutputs);
    }
    outputs
        .into_iter()
        .enumerate()
        .map(|(index, (owners, amount))| {
            if owners.is_empty() {
                return Err(ModelError::EmptyOwners { index });
            }
            if amount == 0 {
                return Err(ModelError::NonPositiveAmount { index });
            }
            Output::generate(&owners, amount)
        })
        .collect()
}

fn parse_metadata(metadata: Option<Value>) -> ModelResult<Option<Map<String, Value>>> {
    match metadata {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ModelError::Schema(format!(
            "metadata must be an object, got {}",
            json_type_name(&other)
        ))),
    }
}

impl TryFrom<TransactionDocument> for Transaction {
    type Error = ModelError;

    fn try_from(document: TransactionDocument) -> Result<Self, Self::Error> {
        let id = document
            .id
            .ok_or_else(|| ModelError::Schema("missing transaction id".into()))?;
        let id = TxId::parse(&id)?;
        let kind = match document.operation {
            Operation::Create => TransactionKind::Create {
                asset: Asset::from_value(document.asset)?,
            },
            Operation::Genesis => TransactionKind::Genesis {
                asset: Asset::from_value(document.asset)?,
            },
            Operation::Transfer => TransactionKind::Transfer {
                asset: serde_json::from_value(document.asset)?,
            },
        };
        Ok(Self {
            id,
            version: document.version,
            kind,
            inputs: document.inputs,
            outputs: document.outputs,
            metadata: parse_metadata(document.metadata)?,
        })
    }
}

impl From<Transaction> for TransactionDocument {
    fn from(tx: Transaction) -> Self {
        tx.document(true)
    }
}
