//! Volume source configuration types.

use serde::{Deserialize, Serialize};

use crate::descriptor::{OptionError, ProducerOptions};
use crate::option::OptionSpec;

fn default_control() -> String {
    "Master".to_string()
}

fn default_interval() -> u64 {
    10
}

/// Volume source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSourceConfig {
    #[serde(default)]
    pub icon: String,
    /// Icon used while muted; falls back to `icon`
    #[serde(default)]
    pub icon_muted: Option<String>,
    /// Sound card index; `None` uses the default device
    #[serde(default)]
    pub card: Option<u32>,
    #[serde(default = "default_control")]
    pub control: String,
    /// Poll interval used when change notifications are unavailable
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for VolumeSourceConfig {
    fn default() -> Self {
        Self {
            icon: String::new(),
            icon_muted: None,
            card: None,
            control: default_control(),
            interval_secs: default_interval(),
        }
    }
}

impl VolumeSourceConfig {
    pub const ID: &'static str = "volume";

    pub fn option_specs() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("icon", "", "Icon shown before the level"),
            OptionSpec::new("icon-muted", "", "Icon shown while muted"),
            OptionSpec::new("card", "", "Sound card index (default device if unset)"),
            OptionSpec::new("control", "Master", "Mixer control to read"),
            OptionSpec::new("interval", "10", "Fallback poll interval in seconds"),
        ]
    }

    pub fn from_options(options: &ProducerOptions) -> Result<Self, OptionError> {
        Ok(Self {
            icon: options.string_or("icon", ""),
            icon_muted: options.get("icon-muted").map(str::to_string),
            card: options.parse(Self::ID, "card")?,
            control: options.string_or("control", "Master"),
            interval_secs: super::parse_interval(options, Self::ID, default_interval())?,
        })
    }

    /// Icon for the current mute state
    pub fn icon_for(&self, muted: bool) -> &str {
        match (&self.icon_muted, muted) {
            (Some(icon), true) => icon,
            _ => &self.icon,
        }
    }
}
