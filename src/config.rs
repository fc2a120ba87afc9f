/// Router configuration
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables of the routing engine
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Enable the joined-table-scan result cache
    pub joined_scan_cache_enabled: bool,

    /// Maximum number of cached joined-scan subtrees
    pub joined_scan_cache_size: usize,

    /// Record partition values from any two-operand comparison on the
    /// partition column, not just equality. This matches the historical
    /// behavior but can under-route inequality predicates; the default
    /// treats non-equality comparators as "not identified" (worst case).
    pub permissive_value_extraction: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            joined_scan_cache_enabled: true,
            joined_scan_cache_size: 1000,
            permissive_value_extraction: false,
        }
    }
}

impl RouterConfig {
    /// Load configuration from a JSON file; absent keys fall back to defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading router config from {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing router config from {}", path.display()))?;
        Ok(config)
    }
}
