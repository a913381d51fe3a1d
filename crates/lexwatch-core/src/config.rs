//! `lexwatch` Configuration Module
//!
//! Provides configuration file support via `lexwatch.toml`, environment variables,
//! and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (builder methods on the loaded struct)
//! 2. Environment variables (`LEXWATCH_*`)
//! 3. Configuration file (`lexwatch.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// How the Edit-distance join establishes pairs for newly registered query words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// Length/letter-mask filters followed by a bounded DP per pair (default).
    #[default]
    Pairwise,
    /// Levenshtein DFA walked in lock-step with a trie of all document words.
    Automaton,
}

/// Batch pipeline configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker threads (0 = available parallelism).
    pub workers: usize,
    /// Maximum number of documents pulled into one batch.
    pub max_batch_documents: usize,
    /// How long an ingesting worker waits for more documents before the
    /// batch is closed, in milliseconds.
    pub batch_linger_ms: u64,
    /// Join strategy for Edit-distance query words.
    pub join_strategy: JoinStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            max_batch_documents: 1024,
            batch_linger_ms: 1,
            join_strategy: JoinStrategy::Pairwise,
        }
    }
}

impl EngineConfig {
    /// Returns the worker count, resolving `0` to the host parallelism.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
    }
}

/// Interning table configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InternerConfig {
    /// Number of independently locked shards (power of two).
    pub shards: usize,
    /// Initial slot capacity per shard (rounded up to a power of two).
    pub initial_capacity: usize,
    /// Load factor, in percent, above which a shard doubles its slots.
    pub max_load_percent: u8,
}

impl Default for InternerConfig {
    fn default() -> Self {
        Self {
            shards: 16,
            initial_capacity: 256,
            max_load_percent: 70,
        }
    }
}

/// Limits configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum document size in bytes.
    pub max_document_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: 64 * 1024,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text, compact or pretty.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `lexwatch` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LexwatchConfig {
    /// Batch pipeline configuration.
    pub engine: EngineConfig,
    /// Interning table configuration.
    pub interner: InternerConfig,
    /// Limits configuration.
    pub limits: LimitsConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl LexwatchConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("lexwatch.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("LEXWATCH_").split("__").lowercase(true));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.engine.workers = workers;
        self
    }

    /// Sets the join strategy.
    #[must_use]
    pub fn with_join_strategy(mut self, strategy: JoinStrategy) -> Self {
        self.engine.join_strategy = strategy;
        self
    }

    /// Sets the per-batch document cap.
    #[must_use]
    pub fn with_max_batch_documents(mut self, max: usize) -> Self {
        self.engine.max_batch_documents = max;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.workers > 1024 {
            return Err(ConfigError::InvalidValue {
                key: "engine.workers".to_string(),
                message: format!("value {} is out of range [0, 1024]", self.engine.workers),
            });
        }

        if self.engine.max_batch_documents == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.max_batch_documents".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if self.engine.batch_linger_ms > 10_000 {
            return Err(ConfigError::InvalidValue {
                key: "engine.batch_linger_ms".to_string(),
                message: format!(
                    "value {} is out of range [0, 10000]",
                    self.engine.batch_linger_ms
                ),
            });
        }

        let shards = self.interner.shards;
        if shards == 0 || shards > 256 || !shards.is_power_of_two() {
            return Err(ConfigError::InvalidValue {
                key: "interner.shards".to_string(),
                message: format!("value {shards} must be a power of two in [1, 256]"),
            });
        }

        if self.interner.initial_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "interner.initial_capacity".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if !(10..=90).contains(&self.interner.max_load_percent) {
            return Err(ConfigError::InvalidValue {
                key: "interner.max_load_percent".to_string(),
                message: format!(
                    "value {} is out of range [10, 90]",
                    self.interner.max_load_percent
                ),
            });
        }

        if self.limits.max_document_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "limits.max_document_bytes".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "compact", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
