//! Shard construction parameters

use crate::error::{Result, ShardError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How often (in scanned points) workers poll for cancellation.
pub const DEFAULT_CANCEL_CHECK_INTERVAL: usize = 256;

/// Configuration for a shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardConfig {
    /// Number of scan workers (and pool threads).
    pub worker_count: usize,
    /// Components per vector.
    pub embedding_size: usize,
    /// Scanned points between cancellation checks.
    #[serde(default = "default_cancel_check_interval")]
    pub cancel_check_interval: usize,
}

fn default_cancel_check_interval() -> usize {
    DEFAULT_CANCEL_CHECK_INTERVAL
}

impl ShardConfig {
    pub fn new(worker_count: usize, embedding_size: usize) -> Self {
        Self {
            worker_count,
            embedding_size,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
        }
    }

    /// Read a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ShardConfig = serde_json::from_str(&text)
            .map_err(|e| ShardError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ShardError::InvalidConfig(
                "worker_count must be positive".to_string(),
            ));
        }
        if self.embedding_size == 0 {
            return Err(ShardError::InvalidConfig(
                "embedding_size must be positive".to_string(),
            ));
        }
        if self.cancel_check_interval == 0 {
            return Err(ShardError::InvalidConfig(
                "cancel_check_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
