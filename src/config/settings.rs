//! Application configuration file

use rg_status_core::{StartupError, DEFAULT_PRODUCERS};
use rg_status_types::ProducerDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::descriptor::parse_descriptors;

/// Current version of the config format
pub const CONFIG_VERSION: u32 = 1;

/// Contents of a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Producers in display order
    #[serde(default)]
    pub producers: Vec<ProducerDescriptor>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl AppConfig {
    /// Load the default configuration file, if there is one
    pub fn load() -> Result<Option<Self>, StartupError> {
        let Some(config_path) = Self::config_path() else {
            log::debug!("Could not determine config directory");
            return Ok(None);
        };

        if !config_path.exists() {
            log::debug!("No config file at {}", config_path.display());
            return Ok(None);
        }

        Self::load_from_path(&config_path).map(Some)
    }

    /// Get the default configuration file path
    pub fn config_path() -> Option<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "github.hilgardt_collab", "rg-status")?;
        Some(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, StartupError> {
        let config_error = |reason: String| StartupError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| config_error(e.to_string()))?;

        if config.version != CONFIG_VERSION {
            log::warn!(
                "Config {} has version {}, expected {}",
                path.display(),
                config.version,
                CONFIG_VERSION
            );
        }
        log::info!(
            "Loaded {} producers from {}",
            config.producers.len(),
            path.display()
        );
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            producers: DEFAULT_PRODUCERS
                .iter()
                .map(|name| ProducerDescriptor::new(*name))
                .collect(),
        }
    }
}

/// Decide which producers to run
///
/// Command-line descriptors win, then an explicit config file, then the
/// default config file, then the built-in default bar.
pub fn resolve_descriptors<S: AsRef<str>>(
    cli: &[S],
    config: Option<&Path>,
) -> Result<Vec<ProducerDescriptor>, StartupError> {
    if !cli.is_empty() {
        if config.is_some() {
            log::info!("Descriptors given on the command line, ignoring config file");
        }
        return parse_descriptors(cli);
    }

    let config = match config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?.unwrap_or_default(),
    };
    Ok(config.producers)
}
