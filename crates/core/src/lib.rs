//! rg-status-core: Core traits and registry for the rg-status aggregator.
//!
//! This crate contains the fundamental `Producer` trait, the immutable
//! producer `Registry`, the `SlotRegistry` that fixes display order, the
//! startup error taxonomy, and shared constants.

pub mod constants;
mod error;
mod producer;
mod registry;
mod slots;

pub use constants::{DEFAULT_PRODUCERS, MIN_CHANNEL_CAPACITY, WORKER_THREAD_PREFIX};
pub use error::{InitError, StartupError};
pub use producer::{BoxedProducer, Producer, ProducerMetadata, Teardown};
pub use registry::{ProducerFactory, ProducerInfo, Registry};
pub use slots::{SlotEntry, SlotRegistry};

// Re-export types used in trait signatures for convenience
pub use rg_status_types::{
    Message, OptionError, OptionSpec, ProducerDescriptor, ProducerOptions, Segment, Snapshot,
};
