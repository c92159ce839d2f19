//! `Strata` Configuration Module
//!
//! Provides configuration file support via `strata.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (builder methods on the index)
//! 2. Environment variables (`STRATA_*`, sections split by `__`,
//!    e.g. `STRATA_INDEX__MAX_EDGES=16`)
//! 3. Configuration file (`strata.toml`)
//! 4. Default values

use crate::distance::DistanceMetric;
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
    /// Failed to parse configuration.
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

/// Index configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of layers, base included.
    pub max_layers: usize,
    /// Maximum neighbor edges per node.
    pub max_edges: usize,
    /// Distance strategy name: `euclidean` or `cosine`.
    pub distance: String,
    /// Seed for level sampling (`None` = built-in seed).
    pub seed: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_layers: 4,
            max_edges: 8,
            distance: DistanceMetric::Euclidean.name().to_string(),
            seed: None,
        }
    }
}

impl IndexConfig {
    /// Validates this section.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range or unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=64).contains(&self.max_layers) {
            return Err(ConfigError::InvalidValue {
                key: "index.max_layers".to_string(),
                message: format!("value {} is out of range [1, 64]", self.max_layers),
            });
        }

        if !(1..=1024).contains(&self.max_edges) {
            return Err(ConfigError::InvalidValue {
                key: "index.max_edges".to_string(),
                message: format!("value {} is out of range [1, 1024]", self.max_edges),
            });
        }

        if DistanceMetric::from_name(&self.distance).is_err() {
            let valid: Vec<&str> = DistanceMetric::ALL.iter().map(DistanceMetric::name).collect();
            return Err(ConfigError::InvalidValue {
                key: "index.distance".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.distance, valid
                ),
            });
        }

        Ok(())
    }
}

/// Logging configuration section.
///
/// The library never installs a subscriber; embedding applications read this
/// section to configure their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main `Strata` configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StrataConfig {
    /// Index configuration.
    pub index: IndexConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl StrataConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < `strata.toml` < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("strata.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("STRATA_").split("__"));

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

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.index.validate()?;

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
