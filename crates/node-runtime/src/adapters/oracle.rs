//! Height oracle backed by a value the embedding process keeps current.

use async_trait::async_trait;
use fl_05_chain_recovery::{HeightOracle, OracleError};
use shared_types::Height;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reports whatever height was last set.
#[derive(Debug, Default)]
pub struct StaticHeightOracle {
    height: AtomicU64,
}

impl StaticHeightOracle {
    pub fn new(height: Height) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    pub fn set_height(&self, height: Height) {
        self.height.store(height, Ordering::SeqCst);
    }
}

#[async_trait]
impl HeightOracle for StaticHeightOracle {
    async fn latest_height(&self) -> Result<Height, OracleError> {
        Ok(self.height.load(Ordering::SeqCst))
    }
}
