//! Producer trait and related types

use crate::error::InitError;
use rg_status_types::{Message, OptionSpec};

/// Metadata about a producer type
#[derive(Debug, Clone)]
pub struct ProducerMetadata {
    /// Unique identifier for this producer type; used as the segment name
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of what this producer reports
    pub description: String,
}

impl ProducerMetadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Trait for all status producers
///
/// A producer reports one piece of live system state. Each configured
/// instance is driven by its own worker, which calls [`Producer::initialize`]
/// once and then alternates between [`Producer::produce`] and
/// [`Producer::suspend_until_next`] for the rest of the process lifetime.
pub trait Producer: Send {
    /// Get metadata about this producer
    fn metadata(&self) -> &ProducerMetadata;

    /// One-time setup: open long-lived handles, capture a baseline reading
    ///
    /// Called exactly once, before the first `produce`. An error aborts
    /// startup of the whole bar.
    fn initialize(&mut self) -> Result<(), InitError> {
        Ok(())
    }

    /// Compute the current reading
    ///
    /// `None` means "nothing new this tick" (for example a transient read
    /// failure); the slot keeps its previous value. Must not block
    /// indefinitely.
    fn produce(&mut self) -> Option<Message>;

    /// Block until the next sampling point
    ///
    /// This is the only place a worker is allowed to wait.
    fn suspend_until_next(&mut self);

    /// Cleanup to run when the bar stops
    ///
    /// Taken once, after `initialize`. Workers are never joined, so anything
    /// that must not outlive the process (child processes, for one) is
    /// released through this hook rather than `Drop`.
    fn teardown(&mut self) -> Option<Teardown> {
        None
    }
}

/// Type-erased producer for dynamic dispatch
pub type BoxedProducer = Box<dyn Producer>;

/// Cleanup handed from a producer to the aggregator
pub type Teardown = Box<dyn FnOnce() + Send>;

/// Option schema helper shared by producer factories
pub(crate) fn describe_options(specs: &[OptionSpec]) -> String {
    specs
        .iter()
        .map(|spec| {
            if spec.default.is_empty() {
                format!("{}: {}", spec.key, spec.description)
            } else {
                format!("{}={}: {}", spec.key, spec.default, spec.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
