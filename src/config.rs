use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::renderer::limits::BatchLimits;

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Settings read once when a [`RenderEngine`](crate::engine::RenderEngine)
/// is built. Missing fields fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity ceilings applied to every batch.
    pub limits: BatchLimits,
    /// Prefix for GPU buffer debug labels.
    pub label_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: BatchLimits::DEFAULT,
            label_prefix: "scene".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
