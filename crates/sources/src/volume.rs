//! Volume producer
//!
//! The mixer level is read with `amixer`. Between readings the producer
//! waits on a long-lived `alsactl monitor` child, which prints one line per
//! mixer event. If the monitor cannot be started or goes away, it falls back
//! to polling at a fixed interval.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rg_status_core::{InitError, Message, Producer, ProducerMetadata, Teardown};
use rg_status_types::source_configs::VolumeSourceConfig;
use std::io::{BufRead, BufReader, Lines};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

static LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,3})%\]").expect("Invalid regex"));
static SWITCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(on|off)\]").expect("Invalid regex"));

/// Playback state of one mixer control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MixerState {
    level: u32,
    muted: bool,
}

/// Parse `amixer get <control>` output
///
/// Uses the first channel that reports a percentage. Controls without a
/// playback switch are never muted.
fn parse_amixer(output: &str) -> Option<MixerState> {
    let line = output.lines().find(|line| LEVEL_RE.is_match(line))?;
    let level = LEVEL_RE.captures(line)?.get(1)?.as_str().parse().ok()?;
    let muted = SWITCH_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .is_some_and(|m| m.as_str() == "off");
    Some(MixerState { level, muted })
}

/// Kill and reap a monitor child; safe to call more than once
fn kill_child(child: &Mutex<Child>) {
    if let Ok(mut child) = child.lock() {
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Blocks on mixer events from `alsactl monitor`
///
/// The child is shared with the teardown hook, which kills it from outside
/// the worker thread when the bar stops.
struct ChangeMonitor {
    child: Arc<Mutex<Child>>,
    lines: Lines<BufReader<ChildStdout>>,
}

impl ChangeMonitor {
    fn spawn(card: Option<u32>) -> Result<Self> {
        let mut command = Command::new("alsactl");
        command.arg("monitor");
        if let Some(card) = card {
            command.arg(format!("hw:{}", card));
        }
        Self::from_command(command).context("spawning alsactl monitor")
    }

    /// Run `command` as the event source; every stdout line is one event
    fn from_command(mut command: Command) -> Result<Self> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child.stdout.take().context("monitor has no stdout")?;

        Ok(Self {
            child: Arc::new(Mutex::new(child)),
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// Wait for the next event; `false` once the monitor has gone away
    fn wait(&mut self) -> bool {
        matches!(self.lines.next(), Some(Ok(_)))
    }

    fn teardown(&self) -> Teardown {
        let child = Arc::clone(&self.child);
        Box::new(move || kill_child(&child))
    }
}

impl Drop for ChangeMonitor {
    fn drop(&mut self) {
        kill_child(&self.child);
    }
}

/// Volume data source
pub struct VolumeSource {
    metadata: ProducerMetadata,
    config: VolumeSourceConfig,
    monitor: Option<ChangeMonitor>,
}

impl VolumeSource {
    pub fn new(config: VolumeSourceConfig) -> Self {
        Self {
            metadata: ProducerMetadata::new(
                VolumeSourceConfig::ID,
                "Volume",
                "Playback volume of a mixer control",
            ),
            config,
            monitor: None,
        }
    }

    fn query(&self) -> Result<MixerState> {
        let mut command = Command::new("amixer");
        if let Some(card) = self.config.card {
            command.args(["-c", &card.to_string()]);
        }
        let output = command
            .args(["-M", "get", &self.config.control])
            .stdin(Stdio::null())
            .output()
            .context("running amixer")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("amixer failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_amixer(&stdout)
            .with_context(|| format!("no playback level for control '{}'", self.config.control))
    }

    fn render(&self, state: MixerState) -> Message {
        Message::with_icon(
            self.config.icon_for(state.muted),
            format!("{}%", state.level),
        )
    }
}

impl Producer for VolumeSource {
    fn metadata(&self) -> &ProducerMetadata {
        &self.metadata
    }

    fn initialize(&mut self) -> Result<(), InitError> {
        self.query()
            .map_err(|e| InitError::from_anyhow(VolumeSourceConfig::ID, &e))?;

        match ChangeMonitor::spawn(self.config.card) {
            Ok(monitor) => self.monitor = Some(monitor),
            Err(e) => log::warn!(
                "volume: no change notifications ({:#}), polling every {}s",
                e,
                self.config.interval_secs
            ),
        }
        Ok(())
    }

    fn produce(&mut self) -> Option<Message> {
        match self.query() {
            Ok(state) => Some(self.render(state)),
            Err(e) => {
                log::debug!("volume: skipping sample: {:#}", e);
                None
            }
        }
    }

    fn suspend_until_next(&mut self) {
        if let Some(monitor) = self.monitor.as_mut() {
            if monitor.wait() {
                return;
            }
            log::warn!(
                "volume: change monitor exited, polling every {}s",
                self.config.interval_secs
            );
            self.monitor = None;
        }
        std::thread::sleep(Duration::from_secs(self.config.interval_secs));
    }

    fn teardown(&mut self) -> Option<Teardown> {
        self.monitor.as_ref().map(ChangeMonitor::teardown)
    }
}
