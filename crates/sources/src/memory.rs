//! Memory (RAM) producer

use anyhow::{Context, Result};
use rg_status_core::{InitError, Message, Producer, ProducerMetadata};
use rg_status_types::source_configs::MemorySourceConfig;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::Duration;

const PROC_MEMINFO: &str = "/proc/meminfo";

/// The `/proc/meminfo` fields needed for the usage figure, in kB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MemInfo {
    total: u64,
    free: u64,
    buffers: u64,
    cached: u64,
}

impl MemInfo {
    fn parse(content: &str) -> Option<Self> {
        let (mut total, mut free, mut buffers, mut cached) = (None, None, None, None);

        for line in content.lines() {
            let mut fields = line.split_whitespace();
            let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
                continue;
            };
            let slot = match key {
                "MemTotal:" => &mut total,
                "MemFree:" => &mut free,
                "Buffers:" => &mut buffers,
                "Cached:" => &mut cached,
                _ => continue,
            };
            *slot = value.parse::<u64>().ok();

            if total.is_some() && free.is_some() && buffers.is_some() && cached.is_some() {
                break;
            }
        }

        Some(Self {
            total: total?,
            free: free?,
            buffers: buffers?,
            cached: cached?,
        })
    }

    /// Memory in use, excluding buffers and page cache
    fn used(&self) -> u64 {
        self.total
            .saturating_sub(self.free)
            .saturating_sub(self.buffers)
            .saturating_sub(self.cached)
    }

    fn percent(&self) -> Option<u64> {
        if self.total == 0 {
            return None;
        }
        Some(self.used() * 100 / self.total)
    }
}

/// Memory data source
///
/// Keeps `/proc/meminfo` open for its whole lifetime and rewinds it before
/// every read.
pub struct MemorySource {
    metadata: ProducerMetadata,
    config: MemorySourceConfig,
    path: PathBuf,
    info: Option<File>,
    buf: String,
}

impl MemorySource {
    pub fn new(config: MemorySourceConfig) -> Self {
        Self::with_path(config, PROC_MEMINFO)
    }

    /// Create a source reading from an explicit meminfo file
    pub fn with_path(config: MemorySourceConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            metadata: ProducerMetadata::new(
                MemorySourceConfig::ID,
                "Memory (RAM)",
                "Share of RAM in use, excluding buffers and cache",
            ),
            config,
            path: path.into(),
            info: None,
            buf: String::with_capacity(4096),
        }
    }

    fn read(&mut self) -> Result<MemInfo> {
        let file = self.info.as_mut().context("meminfo not opened")?;
        file.seek(SeekFrom::Start(0))?;

        self.buf.clear();
        file.read_to_string(&mut self.buf)
            .with_context(|| format!("reading {}", self.path.display()))?;

        MemInfo::parse(&self.buf)
            .with_context(|| format!("missing fields in {}", self.path.display()))
    }
}

impl Producer for MemorySource {
    fn metadata(&self) -> &ProducerMetadata {
        &self.metadata
    }

    fn initialize(&mut self) -> Result<(), InitError> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))
            .map_err(|e| InitError::from_anyhow(MemorySourceConfig::ID, &e))?;
        self.info = Some(file);
        Ok(())
    }

    fn produce(&mut self) -> Option<Message> {
        let info = match self.read() {
            Ok(info) => info,
            Err(e) => {
                log::debug!("memory: skipping sample: {:#}", e);
                return None;
            }
        };

        let percent = info.percent()?;
        Some(Message::with_icon(&self.config.icon, format!("{}%", percent)))
    }

    fn suspend_until_next(&mut self) {
        std::thread::sleep(Duration::from_secs(self.config.interval_secs));
    }
}
