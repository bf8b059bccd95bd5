//! Memory source configuration types.

use serde::{Deserialize, Serialize};

use crate::descriptor::{OptionError, ProducerOptions};
use crate::option::OptionSpec;

fn default_interval() -> u64 {
    5
}

/// Memory source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySourceConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default)]
    pub icon: String,
}

impl Default for MemorySourceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            icon: String::new(),
        }
    }
}

impl MemorySourceConfig {
    pub const ID: &'static str = "memory";

    pub fn option_specs() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("interval", "5", "Seconds between samples"),
            OptionSpec::new("icon", "", "Icon shown before the percentage"),
        ]
    }

    pub fn from_options(options: &ProducerOptions) -> Result<Self, OptionError> {
        Ok(Self {
            interval_secs: super::parse_interval(options, Self::ID, default_interval())?,
            icon: options.string_or("icon", ""),
        })
    }
}
