//! Clock source configuration types.

use serde::{Deserialize, Serialize};

use crate::descriptor::{OptionError, ProducerOptions};
use crate::option::OptionSpec;

/// Default display format, written as a reference layout
pub const DEFAULT_CLOCK_FORMAT: &str = "Mon 2 Jan, 15:04";

fn default_format() -> String {
    DEFAULT_CLOCK_FORMAT.to_string()
}

/// Clock source configuration
///
/// `format` is kept as written; the clock producer decides whether it is a
/// reference layout or a strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSourceConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub icon: String,
    /// IANA time zone name; `None` means the local zone
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for ClockSourceConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            icon: String::new(),
            timezone: None,
        }
    }
}

impl ClockSourceConfig {
    pub const ID: &'static str = "clock";

    pub fn option_specs() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new(
                "format",
                DEFAULT_CLOCK_FORMAT,
                "Reference layout (15:04) or strftime (%H:%M) format",
            ),
            OptionSpec::new("icon", "", "Icon shown before the time"),
            OptionSpec::new("timezone", "local", "IANA time zone, e.g. Europe/London"),
        ]
    }

    pub fn from_options(options: &ProducerOptions) -> Result<Self, OptionError> {
        let format = options.string_or("format", DEFAULT_CLOCK_FORMAT);
        if format.is_empty() {
            return Err(OptionError::new(Self::ID, "format", "", "format is empty"));
        }

        let timezone = match options.get("timezone") {
            None => None,
            Some(tz) if tz.eq_ignore_ascii_case("local") => None,
            Some(tz) => Some(tz.to_string()),
        };

        Ok(Self {
            format,
            icon: options.string_or("icon", ""),
            timezone,
        })
    }
}
