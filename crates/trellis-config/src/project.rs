//! Run Configuration (trellis.toml)
//!
//! Handles the configuration file stored next to the suites being run.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Run configuration from trellis.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Engine scheduling settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineSection>,

    /// Report output settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSection>,

    /// Result store settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreSection>,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Number of suites allowed to run at the same time (default: 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite_concurrency: Option<usize>,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    /// Output format (default: text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,

    /// Print every test, not only failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Colored output (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Result store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Number of summaries returned per page (default: 20)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

/// How run results are printed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "report.format".to_string(),
                reason: format!("must be 'text' or 'json', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

impl ProjectConfig {
    /// Load run configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the run configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(n) = self.engine.as_ref().and_then(|e| e.suite_concurrency) {
            validate_positive("engine.suite_concurrency", n)?;
        }
        if let Some(n) = self.store.as_ref().and_then(|s| s.page_size) {
            validate_positive("store.page_size", n)?;
        }
        Ok(())
    }

    /// Get the configured suite concurrency
    pub fn suite_concurrency(&self) -> Option<usize> {
        self.engine.as_ref().and_then(|e| e.suite_concurrency)
    }

    /// Get the configured page size
    pub fn page_size(&self) -> Option<usize> {
        self.store.as_ref().and_then(|s| s.page_size)
    }

    /// Get the configured report format
    pub fn format(&self) -> Option<ReportFormat> {
        self.report.as_ref().and_then(|r| r.format)
    }
}

pub(crate) fn validate_positive(field: &str, value: usize) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
