//! rg-status-types: Shared data types for the rg-status aggregator.
//!
//! This crate contains pure data types (messages, snapshots, descriptors,
//! producer configs) shared across all rg-status crates. It has no runtime
//! or I/O dependencies, making it suitable as a foundation layer.

pub mod descriptor;
pub mod message;
pub mod option;
pub mod source_configs;

// Re-export commonly used types at the crate root for convenience
pub use descriptor::{OptionError, ProducerDescriptor, ProducerOptions};
pub use message::{Header, Message, Segment, Snapshot};
pub use option::OptionSpec;
