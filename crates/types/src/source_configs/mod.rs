//! Typed configuration for each built-in producer.
//!
//! Every config is parsed from a [`ProducerOptions`] map and knows its own
//! option schema, which is used both for validation and for `--list`.

pub mod clock;
pub mod cpu;
pub mod memory;
pub mod volume;

pub use clock::ClockSourceConfig;
pub use cpu::{CpuSourceConfig, TemperatureUnit};
pub use memory::MemorySourceConfig;
pub use volume::VolumeSourceConfig;

use crate::descriptor::{OptionError, ProducerOptions};

/// Parse a polling interval in whole seconds; zero is rejected
pub(crate) fn parse_interval(
    options: &ProducerOptions,
    producer: &str,
    default: u64,
) -> Result<u64, OptionError> {
    let secs = options.parse_or(producer, "interval", default)?;
    if secs == 0 {
        return Err(OptionError::new(
            producer,
            "interval",
            "0",
            "interval must be at least 1 second",
        ));
    }
    Ok(secs)
}
