//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/i3manager/config.json`.  Every key is optional and
//! unknown keys are ignored, so a minimal `{}` file is valid.
//!
//! # Example
//!
//! ```json
//! {
//!   "outputs": {
//!     "DP-1": { "start": 1 },
//!     "HDMI-A-1": { "start": 101 }
//!   },
//!   "tree_timeout_ms": 60000
//! }
//! ```

use crate::numbering::Band;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-output settings keyed by output name.
    pub outputs: HashMap<String, OutputConfig>,

    /// How long the `workspace-tree` notification stays visible (ms).
    pub tree_timeout_ms: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            outputs: HashMap::new(),
            tree_timeout_ms: 60_000,
        }
    }
}

/// Settings for one output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// First workspace number of the output's band.
    pub start: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { start: 1 }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// First workspace number for `output`; `1` when unconfigured.
    pub fn start_for(&self, output: &str) -> i32 {
        self.outputs
            .get(output)
            .map(|o| o.start)
            .unwrap_or_else(|| OutputConfig::default().start)
    }

    /// The number band of `output`.
    pub fn band_for(&self, output: &str) -> Band {
        Band::new(self.start_for(output))
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
