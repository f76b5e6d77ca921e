//! Assets: the class of value a transaction lineage manipulates.
//!
//! The asset definition travels only with the CREATE that mints it; every
//! later TRANSFER carries an `AssetLink` to that CREATE's id.

use crate::domain::errors::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::TxId;

/// Asset definition carried by a CREATE (or GENESIS) transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Asset {
    /// Opaque payload; when present it is always a JSON object.
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    /// Whether outputs may carry amounts other than 1.
    #[serde(default)]
    pub divisible: bool,
}

impl Asset {
    /// Build an asset. `data` must be a JSON object or `null`.
    pub fn new(data: Option<Value>, divisible: bool) -> ModelResult<Self> {
        let data = match data {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                return Err(ModelError::Schema(format!(
                    "asset data must be an object, got {}",
                    json_type_name(&other)
                )))
            }
        };
        Ok(Self { data, divisible })
    }

    /// An indivisible asset without payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the `asset` member of a CREATE/GENESIS document.
    pub fn from_value(value: Value) -> ModelResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(ModelError::Schema("asset must be an object".into()));
        };
        let divisible = match map.remove("divisible") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => flag,
            Some(other) => {
                return Err(ModelError::Schema(format!(
                    "asset divisible flag must be a boolean, got {}",
                    json_type_name(&other)
                )))
            }
        };
        let data = map.remove("data");
        if let Some(unknown) = map.keys().next() {
            return Err(ModelError::Schema(format!("unknown asset field {unknown:?}")));
        }
        Self::new(data, divisible)
    }

    /// Amount rule for a single output of this asset.
    pub fn validate_amount(&self, amount: u64) -> ModelResult<()> {
        if amount == 0 {
            return Err(ModelError::Amount("amount must be positive".into()));
        }
        if !self.divisible && amount != 1 {
            return Err(ModelError::Amount(
                "non divisible assets always have amount equal to one".into(),
            ));
        }
        Ok(())
    }
}

/// Reference from a TRANSFER to the CREATE that minted the asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetLink {
    pub id: TxId,
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
