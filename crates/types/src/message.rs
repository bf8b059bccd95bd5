//! Status messages, segments and snapshots
//!
//! These are the values that flow from producers through the aggregator to
//! the emitter. Serialization follows the i3bar/swaybar block format.

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A single update for one status slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Full text shown in the bar
    #[serde(rename = "full_text")]
    pub text: String,
    /// Shorter text used by the host when space runs out
    #[serde(
        rename = "short_text",
        default,
        skip_serializing_if = "short_text_is_empty"
    )]
    pub short_text: Option<String>,
}

fn short_text_is_empty(short: &Option<String>) -> bool {
    short.as_deref().map_or(true, str::is_empty)
}

impl Message {
    /// Create a message with only a full text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            short_text: None,
        }
    }

    /// Attach a short text
    pub fn with_short(mut self, short: impl Into<String>) -> Self {
        self.short_text = Some(short.into());
        self
    }

    /// Build `"<icon> <value>"`, dropping the separator when there is no icon
    pub fn with_icon(icon: &str, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        if icon.is_empty() {
            Self::new(value)
        } else {
            Self::new(format!("{} {}", icon, value))
        }
    }
}

/// A named, instanced status slot as seen by the status bar host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Producer type identifier (e.g. "cpu")
    pub name: String,
    /// 1-based ordinal among producers of the same type, as a string
    pub instance: String,
    #[serde(flatten)]
    pub message: Message,
}

impl Segment {
    pub fn new(name: impl Into<String>, instance: impl Into<String>, message: Message) -> Self {
        Self {
            name: name.into(),
            instance: instance.into(),
            message,
        }
    }
}

/// Ordered view of every configured slot
///
/// The number of slots is fixed when the snapshot is created. A slot stays
/// `None` until its producer publishes for the first time and is never
/// cleared afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    slots: Vec<Option<Segment>>,
}

impl Snapshot {
    /// Create a snapshot with `len` empty slots
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Number of configured slots (populated or not)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Segment at `index`, if that slot has been populated
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Store `segment` at `index`
    ///
    /// Returns `false` and leaves the snapshot untouched when `index` is out
    /// of range.
    pub fn set(&mut self, index: usize, segment: Segment) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(segment);
                true
            }
            None => false,
        }
    }

    /// Populated segments in slot order
    pub fn populated(&self) -> impl Iterator<Item = &Segment> {
        self.slots.iter().flatten()
    }

    /// Serialize to one protocol line: the JSON array plus the trailing comma
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push(',');
        Ok(line)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Absent slots are omitted rather than written as null
        serializer.collect_seq(self.populated())
    }
}

/// Protocol header written once before the stream of snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub click_events: bool,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: 1,
            click_events: true,
        }
    }
}
