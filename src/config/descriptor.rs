//! Command-line producer descriptors
//!
//! Syntax: `<type>[:<key>=<value> <key>=<value> ...]`. Values run to the next
//! whitespace unless double-quoted, so `clock:format=15:04` and
//! `clock:format="%a %d %b"` both work.

use once_cell::sync::Lazy;
use regex::Regex;
use rg_status_core::StartupError;
use rg_status_types::{ProducerDescriptor, ProducerOptions};

static DESCRIPTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([[:alpha:]_]+)(?::(.*))?$").expect("Invalid regex"));
static OPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([[:alnum:]_-]+)=("[^"]*"|\S+)"#).expect("Invalid regex"));

/// Parse one descriptor
pub fn parse_descriptor(raw: &str) -> Result<ProducerDescriptor, StartupError> {
    let invalid = || StartupError::InvalidDescriptor(raw.to_string());

    let caps = DESCRIPTOR_RE.captures(raw.trim()).ok_or_else(invalid)?;
    let name = &caps[1];
    let rest = caps.get(2).map_or("", |m| m.as_str());

    let mut options = ProducerOptions::new();
    let mut cursor = 0;
    for option in OPTION_RE.captures_iter(rest) {
        let whole = option.get(0).ok_or_else(invalid)?;
        // Anything between two options other than whitespace is garbage
        if !rest[cursor..whole.start()].trim().is_empty() {
            return Err(invalid());
        }
        cursor = whole.end();

        let value = &option[2];
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        // An opening quote without its closing one
        if value.starts_with('"') {
            return Err(invalid());
        }
        options.insert(&option[1], value);
    }
    if !rest[cursor..].trim().is_empty() {
        return Err(invalid());
    }

    Ok(ProducerDescriptor {
        producer: name.to_string(),
        options,
    })
}

/// Parse every descriptor, stopping at the first invalid one
pub fn parse_descriptors<S: AsRef<str>>(raw: &[S]) -> Result<Vec<ProducerDescriptor>, StartupError> {
    raw.iter().map(|r| parse_descriptor(r.as_ref())).collect()
}
