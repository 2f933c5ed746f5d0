//! Configuration for the process-wide log sink.

use std::env;
use std::path::PathBuf;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Maximum size of the active log file, in bytes, before it rotates.
pub const LOG_MAX_SIZE: u64 = 1024 * 1024;

/// Number of rotated predecessors kept next to the active log file.
pub const DEFAULT_BACKUP_COUNT: usize = 5;

/// Settings for [`init_logging`](crate::logging::init_logging).
///
/// Only the log file path is required; the remaining fields default to the
/// values used by service deployments (everything logged, 1 MiB cap, five
/// archived predecessors), so a partial config file deserializes cleanly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogConfig {
    /// Path of the active log file. Created if it does not exist.
    pub log_file: PathBuf,
    /// Minimum severity a record must meet to be written.
    #[serde(default = "default_level")]
    pub level: LevelFilter,
    /// Size threshold in bytes that triggers rotation.
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    /// Rotated predecessors to keep; `0` restarts the active file in place.
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,
}

/// Serde default for [`LogConfig::level`].
fn default_level() -> LevelFilter {
    LevelFilter::Trace
}

/// Serde default for [`LogConfig::max_size`].
const fn default_max_size() -> u64 {
    LOG_MAX_SIZE
}

/// Serde default for [`LogConfig::backup_count`].
const fn default_backup_count() -> usize {
    DEFAULT_BACKUP_COUNT
}

impl LogConfig {
    /// Creates a config for `log_file` with the default level and rotation
    /// settings.
    pub fn new(log_file: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
            level: default_level(),
            max_size: default_max_size(),
            backup_count: default_backup_count(),
        }
    }

    /// Sets the minimum severity threshold.
    #[must_use]
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Sets the rotation size threshold in bytes.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets how many rotated predecessors are kept.
    #[must_use]
    pub fn with_backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Overrides the severity threshold from the `RUST_LOG` environment
    /// variable when it is set and parseable.
    #[must_use]
    pub fn level_from_env(mut self) -> Self {
        self.level = env::var("RUST_LOG")
            .map(|level| level.parse().unwrap_or(self.level))
            .unwrap_or(self.level);
        self
    }
}
