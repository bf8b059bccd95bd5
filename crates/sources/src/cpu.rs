//! CPU load and temperature producer
//!
//! Load is derived from the aggregate `cpu` line in `/proc/stat` as the share
//! of non-idle time since the previous sample. Temperature comes from a
//! thermal zone, or from a named hardware sensor when one is configured.

use anyhow::{Context, Result};
use rg_status_core::{InitError, Message, Producer, ProducerMetadata};
use rg_status_types::source_configs::CpuSourceConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::Components;

const PROC_STAT: &str = "/proc/stat";

/// Cumulative CPU times from one `/proc/stat` read, in clock ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    idle: u64,
    active: u64,
}

impl CpuTimes {
    /// Parse the aggregate `cpu` line
    ///
    /// idle = idle + iowait; active = user + nice + system + irq + softirq + steal
    fn parse(content: &str) -> Option<Self> {
        let line = content
            .lines()
            .find(|line| line.split_whitespace().next() == Some("cpu"))?;

        let fields: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .map(|f| f.parse().unwrap_or(0))
            .collect();
        if fields.len() < 8 {
            return None;
        }

        Some(Self {
            idle: fields[3] + fields[4],
            active: fields[0] + fields[1] + fields[2] + fields[5] + fields[6] + fields[7],
        })
    }

    fn total(&self) -> u64 {
        self.idle + self.active
    }

    /// Busy percentage between `prev` and `self`; 0 when no time passed
    fn usage_since(&self, prev: &CpuTimes) -> u64 {
        let total = self.total().saturating_sub(prev.total());
        let idle = self.idle.saturating_sub(prev.idle);
        if total == 0 {
            return 0;
        }
        100 * total.saturating_sub(idle) / total
    }
}

fn read_times(path: &Path) -> Result<CpuTimes> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    CpuTimes::parse(&content)
        .with_context(|| format!("no aggregate cpu line in {}", path.display()))
}

/// Whole degrees Celsius from a thermal zone file (millidegrees)
fn read_thermal_zone(path: &Path) -> Option<i32> {
    let raw = std::fs::read_to_string(path).ok()?;
    let millis: i64 = raw.trim().parse().ok()?;
    Some((millis / 1000) as i32)
}

/// Raw reading of the hardware sensor with the given label
///
/// sysinfo reports NaN for a sensor it cannot read.
fn sensor_temperature(components: &Components, label: &str) -> Option<f32> {
    for component in components {
        if component.label() == label {
            return Some(component.temperature());
        }
    }
    None
}

/// Whole degrees Celsius from a sensor reading; `None` if unreadable
fn whole_degrees(reading: f32) -> Option<i32> {
    reading.is_finite().then(|| reading.round() as i32)
}

/// CPU data source
///
/// Reports `"<icon-cpu> 12% <icon-temp> 48°C"`. The temperature part is left
/// out whenever no reading is available.
pub struct CpuSource {
    metadata: ProducerMetadata,
    config: CpuSourceConfig,
    stat_path: PathBuf,
    thermal_path: PathBuf,
    components: Option<Components>,
    prev: Option<CpuTimes>,
}

impl CpuSource {
    pub fn new(config: CpuSourceConfig) -> Self {
        let thermal_path = PathBuf::from(format!(
            "/sys/class/thermal/thermal_zone{}/temp",
            config.thermal_zone
        ));
        Self::with_paths(config, PROC_STAT, thermal_path)
    }

    /// Create a source reading from explicit stat and thermal files
    pub fn with_paths(
        config: CpuSourceConfig,
        stat_path: impl Into<PathBuf>,
        thermal_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            metadata: ProducerMetadata::new(
                CpuSourceConfig::ID,
                "CPU",
                "CPU load and temperature",
            ),
            config,
            stat_path: stat_path.into(),
            thermal_path: thermal_path.into(),
            components: None,
            prev: None,
        }
    }

    fn temperature(&mut self) -> Option<i32> {
        match (&mut self.components, &self.config.sensor) {
            (Some(components), Some(label)) => {
                components.refresh();
                sensor_temperature(components, label).and_then(whole_degrees)
            }
            _ => read_thermal_zone(&self.thermal_path),
        }
    }

    fn render(&self, usage: u64, temperature: Option<i32>) -> Message {
        let load = format!("{}%", usage);
        let mut text = Message::with_icon(&self.config.icon_cpu, &load).text;

        if let Some(celsius) = temperature {
            let scale = self.config.scale;
            let reading = format!("{}{}", scale.convert(celsius), scale.suffix());
            text.push(' ');
            text.push_str(&Message::with_icon(&self.config.icon_temp, reading).text);
        }

        Message::new(text).with_short(load)
    }
}

impl Producer for CpuSource {
    fn metadata(&self) -> &ProducerMetadata {
        &self.metadata
    }

    fn initialize(&mut self) -> Result<(), InitError> {
        let baseline = read_times(&self.stat_path)
            .map_err(|e| InitError::from_anyhow(CpuSourceConfig::ID, &e))?;
        self.prev = Some(baseline);

        if let Some(label) = &self.config.sensor {
            let components = Components::new_with_refreshed_list();
            if sensor_temperature(&components, label).is_none() {
                log::warn!("cpu: sensor '{}' not found, temperature disabled", label);
            }
            self.components = Some(components);
        }

        Ok(())
    }

    fn produce(&mut self) -> Option<Message> {
        let now = match read_times(&self.stat_path) {
            Ok(now) => now,
            Err(e) => {
                log::debug!("cpu: skipping sample: {:#}", e);
                return None;
            }
        };

        let usage = self.prev.map_or(0, |prev| now.usage_since(&prev));
        self.prev = Some(now);

        let temperature = self.temperature();
        Some(self.render(usage, temperature))
    }

    fn suspend_until_next(&mut self) {
        std::thread::sleep(Duration::from_secs(self.config.interval_secs));
    }
}
