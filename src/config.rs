//! Configuration for the taint layer.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, TaintResult};

/// Default cap on the length of a stringified operation argument.
pub const DEFAULT_MAX_ARGUMENT_LENGTH: usize = 128;

/// Runtime settings, typically read from a `taint.config.json` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintConfig {
    /// Master switch. When off, the operation factory still builds records
    /// but `TaintedString` helpers skip provenance bookkeeping.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Arguments longer than this (in chars) are truncated.
    #[serde(default = "default_max_argument_length")]
    pub max_argument_length: usize,

    /// Record call-site locations on operations.
    #[serde(default = "default_true")]
    pub record_locations: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_argument_length() -> usize {
    DEFAULT_MAX_ARGUMENT_LENGTH
}

impl Default for TaintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_argument_length: default_max_argument_length(),
            record_locations: true,
        }
    }
}

impl TaintConfig {
    /// Parse config from a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load config from a specific file.
    pub fn load(path: &Path) -> TaintResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::from)?;
        let config = Self::from_json_str(&content)?;
        debug!(
            "Loaded taint config from {}: {:?}",
            path.display(),
            config
        );
        Ok(config)
    }
}
