use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Largest height gap a single run may roll back.
    pub max_rollback: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self { max_rollback: 1000 }
    }
}
