//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! prefer_mornings = false
//! node_limit = 50000
//!
//! [weights]
//! gap = 6
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::score::ScoreWeights;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_prefer_mornings")]
    pub prefer_mornings: bool,
    #[serde(default)]
    pub weights: ScoreWeights,
    /// Maximum number of search nodes before giving up. `None` never aborts.
    #[serde(default = "default_node_limit")]
    pub node_limit: Option<u64>,
}

fn default_prefer_mornings() -> bool {
    true
}

fn default_node_limit() -> Option<u64> {
    Some(1_000_000)
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            prefer_mornings: default_prefer_mornings(),
            weights: ScoreWeights::default(),
            node_limit: default_node_limit(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    pub fn with_prefer_mornings(mut self, prefer_mornings: bool) -> Self {
        self.prefer_mornings = prefer_mornings;
        self
    }

    pub fn with_node_limit(mut self, node_limit: Option<u64>) -> Self {
        self.node_limit = node_limit;
        self
    }
}
