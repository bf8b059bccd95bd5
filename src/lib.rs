//! rg-status: a status-line aggregator for i3bar/swaybar compatible bars
//!
//! This library provides:
//! - The aggregator that runs one worker per configured producer and
//!   multiplexes their updates into ordered snapshots
//! - The emitter that writes those snapshots in the status bar protocol
//! - Configuration loading (command-line descriptors and config files)

pub mod config;
pub mod core;

// Re-export commonly used types
pub use crate::core::{Aggregator, Emitter};
pub use config::AppConfig;
pub use rg_status_sources::builtin_registry;
pub use rg_status_types::{Message, ProducerDescriptor, Segment, Snapshot};
