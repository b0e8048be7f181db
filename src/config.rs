//! Walker configuration
//!
//! Controls how strictly external trees are read back into models.
//! Readable from a JSON document; absent keys take their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::field::{FieldError, FieldResult};

/// Configuration for the tree walkers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Fail on root keys no field claims instead of ignoring them.
    #[serde(default)]
    pub reject_unknown_keys: bool,

    /// Log decode failures as structured events. Off unless asked for.
    #[serde(default)]
    pub log_failures: bool,
}

impl WalkerConfig {
    /// Reject unknown keys.
    pub fn strict() -> Self {
        Self {
            reject_unknown_keys: true,
            ..Self::default()
        }
    }

    /// Ignore unknown keys (the default).
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Parse from a JSON document.
    pub fn from_json_str(text: &str) -> FieldResult<Self> {
        serde_json::from_str(text).map_err(|e| FieldError::Decode {
            reason: format!("invalid walker config: {}", e),
        })
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> FieldResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| FieldError::Decode {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&text)
    }
}
