//! Configuration management

mod descriptor;
mod settings;

pub use descriptor::{parse_descriptor, parse_descriptors};
pub use settings::{resolve_descriptors, AppConfig, CONFIG_VERSION};
