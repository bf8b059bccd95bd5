//! Registry of producer types

use crate::error::StartupError;
use crate::producer::{describe_options, BoxedProducer};
use rg_status_types::{OptionError, OptionSpec, ProducerOptions};
use std::collections::BTreeMap;

/// Function that builds a configured producer from its option map
pub type ProducerFactory = fn(&ProducerOptions) -> Result<BoxedProducer, OptionError>;

/// Registration info for one producer type
#[derive(Clone)]
pub struct ProducerInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub options: Vec<OptionSpec>,
    factory: ProducerFactory,
}

impl std::fmt::Debug for ProducerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ProducerInfo {
    /// Multi-line `key=default: description` listing of the options
    pub fn options_help(&self) -> String {
        describe_options(&self.options)
    }
}

/// Mapping from producer type name to factory
///
/// Built once at process start and then only read. Nothing here is global:
/// the registry is passed by reference to whatever needs to create producers.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    producers: BTreeMap<String, ProducerInfo>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer type with display info and its option schema
    pub fn register(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
        options: Vec<OptionSpec>,
        factory: ProducerFactory,
    ) {
        if self.producers.contains_key(id) {
            log::warn!("Producer '{}' registered twice, replacing", id);
        }
        self.producers.insert(
            id.to_string(),
            ProducerInfo {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                options,
                factory,
            },
        );
    }

    /// Builder-style variant of [`Registry::register`]
    pub fn with_producer(
        mut self,
        id: &str,
        name: &str,
        description: &str,
        options: Vec<OptionSpec>,
        factory: ProducerFactory,
    ) -> Self {
        self.register(id, name, description, options, factory);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.producers.contains_key(id)
    }

    pub fn info(&self, id: &str) -> Option<&ProducerInfo> {
        self.producers.get(id)
    }

    /// Create and configure a producer by type name
    pub fn create(
        &self,
        id: &str,
        options: &ProducerOptions,
    ) -> Result<BoxedProducer, StartupError> {
        let info = self
            .producers
            .get(id)
            .ok_or_else(|| StartupError::UnknownProducer(id.to_string()))?;
        options.warn_unknown(id, &info.options);
        Ok((info.factory)(options)?)
    }

    /// All registered producers, sorted by id
    pub fn list(&self) -> impl Iterator<Item = &ProducerInfo> {
        self.producers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::{Producer, ProducerMetadata};
    use rg_status_types::Message;

    struct Fixed {
        metadata: ProducerMetadata,
        text: String,
    }

    impl Producer for Fixed {
        fn metadata(&self) -> &ProducerMetadata {
            &self.metadata
        }

        fn produce(&mut self) -> Option<Message> {
            Some(Message::new(self.text.clone()))
        }

        fn suspend_until_next(&mut self) {}
    }

    fn fixed_factory(options: &ProducerOptions) -> Result<BoxedProducer, OptionError> {
        let text = options.string_or("text", "fixed");
        if text == "bad" {
            return Err(OptionError::new("fixed", "text", "bad", "not allowed"));
        }
        Ok(Box::new(Fixed {
            metadata: ProducerMetadata::new("fixed", "Fixed", "Fixed text"),
            text,
        }))
    }

    fn registry() -> Registry {
        Registry::new().with_producer(
            "fixed",
            "Fixed",
            "Fixed text",
            vec![OptionSpec::new("text", "fixed", "Text to show")],
            fixed_factory,
        )
    }

    #[test]
    fn test_create_known_producer() {
        let options: ProducerOptions = [("text", "hello")].into_iter().collect();
        let mut producer = registry().create("fixed", &options).unwrap();
        assert_eq!(producer.produce().unwrap().text, "hello");
        assert_eq!(producer.metadata().id, "fixed");
    }

    #[test]
    fn test_create_unknown_producer() {
        let err = registry()
            .create("battery", &ProducerOptions::new())
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::UnknownProducer(ref name) if name == "battery"));
    }

    #[test]
    fn test_create_with_invalid_option() {
        let options: ProducerOptions = [("text", "bad")].into_iter().collect();
        let err = registry().create("fixed", &options).err().unwrap();
        assert!(matches!(err, StartupError::InvalidOption(_)));
    }

    #[test]
    fn test_options_help() {
        let registry = registry();
        let info = registry.info("fixed").unwrap();
        assert_eq!(info.options_help(), "text=fixed: Text to show");
        assert_eq!(registry.list().count(), 1);
    }
}
