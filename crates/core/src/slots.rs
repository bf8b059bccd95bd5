//! Slot registry: display positions and instance ordinals

use crate::error::StartupError;
use crate::registry::Registry;
use rg_status_types::{ProducerDescriptor, ProducerOptions};
use std::collections::HashMap;

/// One resolved slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    /// Zero-based position in the output, equal to the descriptor position
    pub index: usize,
    /// Producer type name
    pub producer: String,
    /// 1-based ordinal among slots of the same producer type
    pub instance: usize,
    pub options: ProducerOptions,
}

impl SlotEntry {
    /// Instance ordinal as it appears in the protocol
    pub fn instance_label(&self) -> String {
        self.instance.to_string()
    }
}

/// Fixed mapping from configured producers to slot positions
///
/// Built once from the configuration list and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotRegistry {
    entries: Vec<SlotEntry>,
}

impl SlotRegistry {
    /// Assign indices and instance ordinals to `descriptors`
    ///
    /// Every descriptor must name a producer known to `registry`; the first
    /// one that does not aborts with [`StartupError::UnknownProducer`].
    pub fn resolve(
        descriptors: &[ProducerDescriptor],
        registry: &Registry,
    ) -> Result<Self, StartupError> {
        let mut counters: HashMap<&str, usize> = HashMap::new();
        let mut entries = Vec::with_capacity(descriptors.len());

        for (index, descriptor) in descriptors.iter().enumerate() {
            let name = descriptor.producer.as_str();
            if !registry.contains(name) {
                return Err(StartupError::UnknownProducer(name.to_string()));
            }

            let counter = counters.entry(name).or_insert(0);
            *counter += 1;

            entries.push(SlotEntry {
                index,
                producer: name.to_string(),
                instance: *counter,
                options: descriptor.options.clone(),
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SlotEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
