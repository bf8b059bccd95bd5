//! Aggregation engine: the worker pool and the protocol emitter

mod aggregator;
mod emitter;

pub use aggregator::{Aggregator, SnapshotReceiver};
pub use emitter::Emitter;

// Re-export the building blocks the engine is made of
pub use rg_status_core::{
    BoxedProducer, InitError, Producer, ProducerMetadata, Registry, SlotEntry, SlotRegistry,
    StartupError, Teardown,
};
