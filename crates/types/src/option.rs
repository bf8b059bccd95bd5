//! Option metadata for describing what a producer accepts

use serde::{Deserialize, Serialize};

/// Metadata describing a single producer option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Option name as written in a descriptor (e.g. "interval")
    pub key: String,
    /// Default value, as it would be written
    pub default: String,
    /// Human-readable description
    pub description: String,
}

impl OptionSpec {
    pub fn new(
        key: impl Into<String>,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
            description: description.into(),
        }
    }
}
