//! CPU source configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::descriptor::{OptionError, ProducerOptions};
use crate::option::OptionSpec;

/// Temperature units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    /// Convert whole degrees Celsius into this unit
    pub fn convert(&self, celsius: i32) -> i32 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => (celsius as f64 * 1.8).floor() as i32 + 32,
            TemperatureUnit::Kelvin => celsius + 273,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
            TemperatureUnit::Kelvin => "K",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            "k" | "kelvin" => Ok(TemperatureUnit::Kelvin),
            _ => Err("expected one of C, F, K".to_string()),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_interval() -> u64 {
    5
}

/// CPU source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSourceConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default)]
    pub scale: TemperatureUnit,
    #[serde(default)]
    pub icon_cpu: String,
    #[serde(default)]
    pub icon_temp: String,
    /// Index of `/sys/class/thermal/thermal_zone<N>`
    #[serde(default)]
    pub thermal_zone: u32,
    /// Hardware sensor label; overrides the thermal zone when set
    #[serde(default)]
    pub sensor: Option<String>,
}

impl Default for CpuSourceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            scale: TemperatureUnit::Celsius,
            icon_cpu: String::new(),
            icon_temp: String::new(),
            thermal_zone: 0,
            sensor: None,
        }
    }
}

impl CpuSourceConfig {
    pub const ID: &'static str = "cpu";

    pub fn option_specs() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("interval", "5", "Seconds between samples"),
            OptionSpec::new("scale", "C", "Temperature scale (C, F or K)"),
            OptionSpec::new("icon-cpu", "", "Icon shown before the load"),
            OptionSpec::new("icon-temp", "", "Icon shown before the temperature"),
            OptionSpec::new("thermal-zone", "0", "Thermal zone index to read"),
            OptionSpec::new("sensor", "", "Hardware sensor label to read instead"),
        ]
    }

    pub fn from_options(options: &ProducerOptions) -> Result<Self, OptionError> {
        let defaults = Self::default();
        Ok(Self {
            interval_secs: super::parse_interval(options, Self::ID, defaults.interval_secs)?,
            scale: options.parse_or(Self::ID, "scale", defaults.scale)?,
            icon_cpu: options.string_or("icon-cpu", ""),
            icon_temp: options.string_or("icon-temp", ""),
            thermal_zone: options.parse_or(Self::ID, "thermal-zone", defaults.thermal_zone)?,
            sensor: options
                .get("sensor")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_options() {
        let config = CpuSourceConfig::from_options(&ProducerOptions::new()).unwrap();
        assert_eq!(config, CpuSourceConfig::default());
    }

    #[test]
    fn test_parses_all_options() {
        let options: ProducerOptions = [
            ("interval", "2"),
            ("scale", "f"),
            ("icon-cpu", "C"),
            ("icon-temp", "T"),
            ("thermal-zone", "3"),
            ("sensor", "Tctl"),
        ]
        .into_iter()
        .collect();
        let config = CpuSourceConfig::from_options(&options).unwrap();
        assert_eq!(config.interval_secs, 2);
        assert_eq!(config.scale, TemperatureUnit::Fahrenheit);
        assert_eq!(config.icon_cpu, "C");
        assert_eq!(config.thermal_zone, 3);
        assert_eq!(config.sensor.as_deref(), Some("Tctl"));
    }

    #[test]
    fn test_rejects_zero_interval_and_bad_scale() {
        let zero: ProducerOptions = [("interval", "0")].into_iter().collect();
        assert_eq!(CpuSourceConfig::from_options(&zero).unwrap_err().key, "interval");

        let scale: ProducerOptions = [("scale", "R")].into_iter().collect();
        assert_eq!(CpuSourceConfig::from_options(&scale).unwrap_err().key, "scale");
    }

    #[test]
    fn test_temperature_conversion() {
        assert_eq!(TemperatureUnit::Celsius.convert(48), 48);
        assert_eq!(TemperatureUnit::Fahrenheit.convert(48), 118);
        assert_eq!(TemperatureUnit::Fahrenheit.convert(-10), 14);
        assert_eq!(TemperatureUnit::Kelvin.convert(27), 300);
    }
}
