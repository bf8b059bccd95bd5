//! rg-status-sources: Producer implementations for the rg-status aggregator.

mod clock;
mod cpu;
mod memory;
mod volume;

pub use clock::{layout_to_strftime, ClockSource};
pub use cpu::CpuSource;
pub use memory::MemorySource;
pub use volume::VolumeSource;

use rg_status_core::{BoxedProducer, OptionError, ProducerOptions, Registry};
use rg_status_types::source_configs::{
    ClockSourceConfig, CpuSourceConfig, MemorySourceConfig, VolumeSourceConfig,
};

fn create_cpu(options: &ProducerOptions) -> Result<BoxedProducer, OptionError> {
    Ok(Box::new(CpuSource::new(CpuSourceConfig::from_options(options)?)))
}

fn create_memory(options: &ProducerOptions) -> Result<BoxedProducer, OptionError> {
    Ok(Box::new(MemorySource::new(MemorySourceConfig::from_options(options)?)))
}

fn create_clock(options: &ProducerOptions) -> Result<BoxedProducer, OptionError> {
    Ok(Box::new(ClockSource::new(ClockSourceConfig::from_options(options)?)?))
}

fn create_volume(options: &ProducerOptions) -> Result<BoxedProducer, OptionError> {
    Ok(Box::new(VolumeSource::new(VolumeSourceConfig::from_options(options)?)))
}

/// Register all built-in producers with `registry`
pub fn register_all(registry: &mut Registry) {
    registry.register(
        CpuSourceConfig::ID,
        "CPU",
        "CPU load and temperature",
        CpuSourceConfig::option_specs(),
        create_cpu,
    );

    registry.register(
        MemorySourceConfig::ID,
        "Memory",
        "Share of RAM in use",
        MemorySourceConfig::option_specs(),
        create_memory,
    );

    registry.register(
        ClockSourceConfig::ID,
        "Clock",
        "Current date and time",
        ClockSourceConfig::option_specs(),
        create_clock,
    );

    registry.register(
        VolumeSourceConfig::ID,
        "Volume",
        "Playback volume of a mixer control",
        VolumeSourceConfig::option_specs(),
        create_volume,
    );
}

/// Registry holding every built-in producer
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    register_all(&mut registry);
    registry
}
