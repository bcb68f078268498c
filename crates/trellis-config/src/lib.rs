//! Trellis Configuration System
//!
//! Provides configuration management for trellis runs:
//! - Run configuration (trellis.toml)
//! - Environment variable overrides
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Run config (./trellis.toml, searched upwards from the start directory)
//! 2. Environment variables (TRELLIS_*, NO_COLOR)
//! 3. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use trellis_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! assert!(config.suite_concurrency() >= 1);
//! ```

pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Name of the configuration file searched for by [`ConfigLoader`].
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

pub use loader::{Config, ConfigLoader};
pub use project::{EngineSection, ProjectConfig, ReportFormat, ReportSection, StoreSection};
