//! Pipeline configuration, passed in at construction.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

/// Store-interaction limits for validation.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Bound on every individual store call.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "store_timeout_ms")]
    pub store_timeout: Duration,
    /// Caller-level retries of a transient failure.
    pub max_transient_retries: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "retry_backoff_ms")]
    pub retry_backoff: Duration,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(2),
            max_transient_retries: 3,
            retry_backoff: Duration::from_millis(50),
        }
    }
}
