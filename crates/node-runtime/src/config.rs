//! # Node Configuration
//!
//! One explicit value handed to every constructor at startup. Nothing in
//! the core reads ambient configuration after that. Loading and merging
//! from files or the environment is left to the embedding process; every
//! section derives serde so any format will do.

use crate::telemetry::LoggingConfig;
use fl_03_validation::ValidationConfig;
use fl_04_consensus_rules::{ConsensusStrategy, Keyring};
use fl_05_chain_recovery::RecoveryConfig;
use serde::{Deserialize, Serialize};
use shared_crypto::{Keypair, PublicKey};
use std::fmt;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Node keypair not configured")]
    KeypairNotFound,

    #[error("Invalid node seed: {0}")]
    InvalidSeed(String),

    #[error("Federation keyring is empty")]
    EmptyKeyring,

    #[error("Node key {0} is not in the federation keyring")]
    NodeNotInKeyring(PublicKey),

    #[error("Store timeout must be non-zero")]
    ZeroTimeout,

    #[error("Invalid log filter {0:?}")]
    InvalidLogFilter(String),
}

/// Ed25519 signing seed, hex encoded on the wire. Wiped on drop and never
/// printed.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeSeed(Zeroizing<[u8; 32]>);

impl NodeSeed {
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self(keypair.to_seed())
    }

    pub fn keypair(&self) -> Keypair {
        Keypair::from_seed(*self.0)
    }
}

impl TryFrom<String> for NodeSeed {
    type Error = ConfigError;

    fn try_from(encoded: String) -> Result<Self, Self::Error> {
        let encoded = Zeroizing::new(encoded);
        let mut seed = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(encoded.as_str(), seed.as_mut_slice())
            .map_err(|err| ConfigError::InvalidSeed(err.to_string()))?;
        Ok(Self(seed))
    }
}

impl From<NodeSeed> for String {
    fn from(seed: NodeSeed) -> Self {
        hex::encode(*seed.0)
    }
}

impl fmt::Debug for NodeSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodeSeed([REDACTED])")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    pub seed: Option<NodeSeed>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusSection {
    pub strategy: ConsensusStrategy,
    pub keyring: Keyring,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub consensus: ConsensusSection,
    pub validation: ValidationConfig,
    pub recovery: RecoveryConfig,
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// A federation of one: `keypair` is the only member.
    pub fn single_node(keypair: &Keypair) -> Self {
        Self::federation_member(keypair, Keyring::new([keypair.public_key()]))
    }

    pub fn federation_member(keypair: &Keypair, keyring: Keyring) -> Self {
        Self {
            node: NodeSection {
                seed: Some(NodeSeed::from_keypair(keypair)),
            },
            consensus: ConsensusSection {
                strategy: ConsensusStrategy::default(),
                keyring,
            },
            ..Self::default()
        }
    }

    pub fn node_keypair(&self) -> Result<Keypair, ConfigError> {
        self.node
            .seed
            .as_ref()
            .map(NodeSeed::keypair)
            .ok_or(ConfigError::KeypairNotFound)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let keypair = self.node_keypair()?;
        if self.consensus.keyring.is_empty() {
            return Err(ConfigError::EmptyKeyring);
        }
        if !self.consensus.keyring.contains(&keypair.public_key()) {
            return Err(ConfigError::NodeNotInKeyring(keypair.public_key()));
        }
        if self.validation.store_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        EnvFilter::try_new(&self.logging.level)
            .map_err(|_| ConfigError::InvalidLogFilter(self.logging.level.clone()))?;
        Ok(())
    }
}
