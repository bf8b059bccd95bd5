//! Shared constants

/// Producers shown when neither descriptors nor a config file are given
pub const DEFAULT_PRODUCERS: &[&str] = &["cpu", "memory", "clock"];

/// Lower bound for the output channel capacity
pub const MIN_CHANNEL_CAPACITY: usize = 1;

/// Worker threads are named `<prefix><type>-<instance>`
pub const WORKER_THREAD_PREFIX: &str = "rg-status-";
