//! Configuration loading traits and types.
//!
//! Every binary and test in the workspace reads the printer parameter table
//! through [`ConfigLoader`]. Loading is two-step: TOML parse, then the
//! type's own [`Validate::validate`] pass. A table that fails either step is
//! rejected before any hardware is touched.
//!
//! # Usage
//!
//! ```rust,no_run
//! use delta_common::config::{ConfigError, ConfigLoader};
//! use delta_common::printer::config::PrinterConfig;
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = PrinterConfig::load(Path::new("printer.toml"))?;
//!     println!("Machine: {}", config.shared.machine_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-step tracing.
    Trace,
    /// Per-segment planner decisions.
    Debug,
    /// Lifecycle events (homing, commits, emergency).
    #[default]
    Info,
    /// Recoverable anomalies such as event queue overflow.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common fields embedded in the printer parameter table.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// machine_name = "teensy3-delta"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Machine instance identifier used in log output.
    pub machine_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `machine_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.machine_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "machine_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Semantic validation run after a successful parse.
pub trait Validate {
    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` naming the offending field.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Loads a TOML table and validates it.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax or shape is invalid
/// - Returns `ConfigError::ValidationError` if semantic validation fails
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned + Validate {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        Self::load_str(&content)
    }

    /// Parse and validate configuration held in memory.
    fn load_str(content: &str) -> Result<Self, ConfigError> {
        let value: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        value.validate()?;
        Ok(value)
    }
}

impl<T: serde::de::DeserializeOwned + Validate> ConfigLoader for T {}
