//! # Core Identifiers
//!
//! Content-addressed identifiers used throughout the ledger.
//!
//! - `TxId`: SHA3-256 of a transaction's canonical body (id excluded)
//! - `BlockId`: SHA3-256 of a block's canonical body
//! - `OutputRef`: link from a TRANSFER input to a prior transaction output

use crate::encoding::sha3_256_hex;
use crate::errors::EncodingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte digest.
pub type Hash = [u8; 32];

/// Block height in the local chain. The genesis block sits at height 0.
pub type Height = u64;

macro_rules! digest_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse a 64-character lowercase hex digest.
            pub fn parse(value: &str) -> Result<Self, EncodingError> {
                let well_formed = value.len() == 64
                    && value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
                if well_formed {
                    Ok(Self(value.to_owned()))
                } else {
                    Err(EncodingError::InvalidDigest(value.to_owned()))
                }
            }

            /// Identifier of the given canonical bytes.
            pub fn digest_of(canonical: &[u8]) -> Self {
                Self(sha3_256_hex(canonical))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = EncodingError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

digest_id!(
    /// Transaction identifier.
    TxId
);

digest_id!(
    /// Block identifier.
    BlockId
);

/// Reference to an output of an earlier transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputRef {
    /// Transaction that created the output.
    pub tx_id: TxId,
    /// Position of the output within that transaction.
    pub output_index: u32,
}

impl OutputRef {
    pub fn new(tx_id: TxId, output_index: u32) -> Self {
        Self {
            tx_id,
            output_index,
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.output_index)
    }
}
