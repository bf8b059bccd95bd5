//! Producer descriptors and their untyped option maps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::option::OptionSpec;

/// One configured producer instance: a type name plus flat string options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerDescriptor {
    /// Registered producer type (e.g. "cpu", "clock")
    #[serde(rename = "type")]
    pub producer: String,
    #[serde(default)]
    pub options: ProducerOptions,
}

impl ProducerDescriptor {
    pub fn new(producer: impl Into<String>) -> Self {
        Self {
            producer: producer.into(),
            options: ProducerOptions::default(),
        }
    }

    /// Add an option, builder style
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key, value);
        self
    }
}

impl fmt::Display for ProducerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.producer)?;
        for (i, (key, value)) in self.options.iter().enumerate() {
            let sep = if i == 0 { ':' } else { ' ' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

/// A value in a producer's option map could not be converted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{producer}.{key}: invalid value '{value}': {reason}")]
pub struct OptionError {
    pub producer: String,
    pub key: String,
    pub value: String,
    pub reason: String,
}

impl OptionError {
    pub fn new(
        producer: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            producer: producer.into(),
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Flat option-name to option-value mapping for one producer instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProducerOptions {
    values: BTreeMap<String, String>,
}

impl ProducerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String option, falling back to `default`
    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Parse an option with `FromStr`
    ///
    /// Returns `Ok(None)` when the key is not set.
    pub fn parse<T>(&self, producer: &str, key: &str) -> Result<Option<T>, OptionError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| OptionError::new(producer, key, raw, e.to_string())),
        }
    }

    /// Parse an option, falling back to `default` when unset
    pub fn parse_or<T>(&self, producer: &str, key: &str, default: T) -> Result<T, OptionError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(self.parse(producer, key)?.unwrap_or(default))
    }

    /// Keys not described by `specs`
    pub fn unknown_keys<'a>(&'a self, specs: &[OptionSpec]) -> Vec<&'a str> {
        self.values
            .keys()
            .filter(|key| !specs.iter().any(|spec| spec.key == key.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Log a warning for every key the producer does not understand
    pub fn warn_unknown(&self, producer: &str, specs: &[OptionSpec]) {
        for key in self.unknown_keys(specs) {
            log::warn!("{}: ignoring unknown option '{}'", producer, key);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProducerOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}
