//! Engine configuration.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Configuration for the sync engine and the in-process hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether a context built from this config starts enabled.
    pub enabled_by_default: bool,
    /// Buffer size of each broadcast channel in the subscription hub.
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: true,
            channel_capacity: 64,
        }
    }
}

impl SyncConfig {
    /// Parses a config from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> SyncResult<()> {
        if self.channel_capacity == 0 {
            return Err(SyncError::Config(
                "channel_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
