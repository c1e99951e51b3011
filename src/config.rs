//! Runtime configuration for the assembly pipeline.
//!
//! [`StreamerConfig`] gathers the knobs consumed by the buffer and queue:
//! queue capacity, staleness window, and the overflow and duplicate
//! policies. It can be built in code, parsed from TOML, or overridden from
//! the command line.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    buffer::DuplicatePolicy,
    queue::{MAX_QUEUE_CAPACITY, OverflowPolicy},
};

/// Default number of completed events the queue holds before applying back-pressure.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
/// Default time a partial event may wait for missing fragments.
pub const DEFAULT_STALENESS_WINDOW_MS: u64 = 5_000;
const DEFAULT_DROP_LOG_INTERVAL_MS: u64 = 10_000;

/// Errors raised while loading or validating a [`StreamerConfig`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The queue capacity is zero or above [`MAX_QUEUE_CAPACITY`].
    #[error("invalid queue capacity {0}; must be between 1 and {max}", max = MAX_QUEUE_CAPACITY)]
    InvalidCapacity(usize),
    /// A zero staleness window would evict every partial event immediately.
    #[error("staleness window must be at least 1 ms")]
    ZeroStalenessWindow,
    /// Drop logging cadence must be at least one.
    #[error("drop_log_every_n must be at least 1")]
    ZeroDropLogCadence,
}

/// Settings for the fragment buffer and event queue.
///
/// # Examples
///
/// ```
/// use streamer::{OverflowPolicy, StreamerConfig};
///
/// let config = StreamerConfig::from_toml_str(
///     r#"
///     queue_capacity = 8
///     staleness_window_ms = 250
///     overflow_policy = "drop"
///     "#,
/// )
/// .expect("valid config");
/// assert_eq!(config.queue_capacity, 8);
/// assert_eq!(config.overflow_policy, OverflowPolicy::Drop);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamerConfig {
    /// Maximum number of completed events waiting for a consumer.
    pub queue_capacity: usize,
    /// Age in milliseconds after which an incomplete event is discarded.
    pub staleness_window_ms: u64,
    /// What a producer does when the queue is full.
    pub overflow_policy: OverflowPolicy,
    /// How a repeated `(event_id, fragment_index)` is treated.
    pub duplicate_policy: DuplicatePolicy,
    /// Emit a drop warning after this many dropped events.
    pub drop_log_every_n: usize,
    /// Emit a drop warning at least this often (milliseconds) while drops occur.
    pub drop_log_interval_ms: u64,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            staleness_window_ms: DEFAULT_STALENESS_WINDOW_MS,
            overflow_policy: OverflowPolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            // Log every drop by default so tests and development
            // environments observe overload immediately.
            drop_log_every_n: 1,
            drop_log_interval_ms: DEFAULT_DROP_LOG_INTERVAL_MS,
        }
    }
}

impl StreamerConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and any validation
    /// error reported by [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// the same errors as [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that every field is within its supported range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ConfigError::InvalidCapacity(self.queue_capacity));
        }
        if self.staleness_window_ms == 0 {
            return Err(ConfigError::ZeroStalenessWindow);
        }
        if self.drop_log_every_n == 0 {
            return Err(ConfigError::ZeroDropLogCadence);
        }
        Ok(())
    }

    /// Staleness window as a [`Duration`].
    #[must_use]
    pub const fn staleness_window(&self) -> Duration {
        Duration::from_millis(self.staleness_window_ms)
    }

    /// Drop-log interval as a [`Duration`].
    #[must_use]
    pub const fn drop_log_interval(&self) -> Duration {
        Duration::from_millis(self.drop_log_interval_ms)
    }
}
