//! Startup error taxonomy
//!
//! Only startup can fail. Once workers are running, producer problems are
//! absorbed by the worker that owns the producer.

use rg_status_types::OptionError;
use std::fmt;
use std::path::PathBuf;

/// A producer's one-time setup failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{producer}: initialization failed: {reason}")]
pub struct InitError {
    pub producer: String,
    pub reason: String,
}

impl InitError {
    pub fn new(producer: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            producer: producer.into(),
            reason: reason.to_string(),
        }
    }

    /// Keep the whole context chain of an `anyhow` error
    pub fn from_anyhow(producer: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::new(producer, format!("{:#}", err))
    }
}

/// Everything that can abort startup before the first line is written
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid producer descriptor '{0}'")]
    InvalidDescriptor(String),

    #[error("producer with name '{0}' does not exist")]
    UnknownProducer(String),

    #[error(transparent)]
    InvalidOption(#[from] OptionError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error("{}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl StartupError {
    /// Process exit code for this failure class
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::InvalidDescriptor(_) => 2,
            StartupError::UnknownProducer(_) => 3,
            StartupError::InvalidOption(_) => 4,
            StartupError::Init(_) => 5,
            StartupError::Config { .. } => 6,
        }
    }
}
