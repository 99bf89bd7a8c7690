//! Graph-level settings, loadable from JSON.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Cache node samples within one call so shared ancestors are drawn once.
    pub memoize: bool,
    /// Maximum evaluation depth before a call fails with `RecursionLimit`.
    pub max_depth: usize,
    /// Bin count used by `hist` when none is given.
    pub default_bins: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { memoize: true, max_depth: 1_000, default_bins: 10 }
    }
}

impl GraphConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GraphConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be positive".into()));
        }
        if self.default_bins == 0 {
            return Err(ConfigError::Invalid("default_bins must be positive".into()));
        }
        Ok(())
    }
}
