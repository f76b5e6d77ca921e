//! # Canonical Encoding
//!
//! JSON with lexicographically sorted object keys and no insignificant
//! whitespace. Key order is re-established explicitly so the output does not
//! depend on whether `serde_json` was built with `preserve_order`.

use crate::entities::Hash;
use crate::errors::EncodingError;
use serde::Serialize;
use serde_json::{Map, Value};
use sha3::{Digest, Sha3_256};

/// Convert a value to its canonical JSON tree (all object keys sorted).
pub fn canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, EncodingError> {
    let value = serde_json::to_value(value)?;
    Ok(sort_keys(value))
}

/// Serialize a value to its canonical JSON string.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodingError> {
    let value = canonical_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// SHA3-256 digest of raw bytes.
pub fn sha3_256(data: &[u8]) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA3-256 digest of raw bytes as lowercase hex.
pub fn sha3_256_hex(data: &[u8]) -> String {
    hex::encode(sha3_256(data))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, val) in entries {
                sorted.insert(key, sort_keys(val));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
