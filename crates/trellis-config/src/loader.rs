//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::project::{validate_positive, ProjectConfig, ReportFormat};
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_SUITE_CONCURRENCY: usize = 1;
const DEFAULT_PAGE_SIZE: usize = 20;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Run config (./trellis.toml) - lowest priority
/// 2. Environment variables (TRELLIS_*) - overrides the file
/// 3. CLI flags - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides (used by tests and embedders)
    ignore_env: bool,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Run configuration after environment overrides
    pub project: ProjectConfig,

    /// Directory where trellis.toml was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Do not apply TRELLIS_* environment overrides
    pub fn without_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find trellis.toml. A missing file is not
    /// an error; defaults are used instead.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let project = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project,
            project_root,
        })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project,
            project_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find run configuration by walking up directory tree
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides to the run config
    ///
    /// Recognized variables: TRELLIS_SUITE_CONCURRENCY, TRELLIS_PAGE_SIZE,
    /// TRELLIS_FORMAT, TRELLIS_VERBOSE, TRELLIS_NO_COLOR and NO_COLOR.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        if let Ok(value) = env::var("TRELLIS_SUITE_CONCURRENCY") {
            let n = parse_count("TRELLIS_SUITE_CONCURRENCY", &value)?;
            config.engine.get_or_insert_with(Default::default).suite_concurrency = Some(n);
        }

        if let Ok(value) = env::var("TRELLIS_PAGE_SIZE") {
            let n = parse_count("TRELLIS_PAGE_SIZE", &value)?;
            config.store.get_or_insert_with(Default::default).page_size = Some(n);
        }

        if let Ok(value) = env::var("TRELLIS_FORMAT") {
            let format: ReportFormat = value.parse()?;
            config.report.get_or_insert_with(Default::default).format = Some(format);
        }

        if let Ok(value) = env::var("TRELLIS_VERBOSE") {
            config.report.get_or_insert_with(Default::default).verbose = Some(is_truthy(&value));
        }

        if env::var("TRELLIS_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok() {
            config.report.get_or_insert_with(Default::default).color = Some(false);
        }

        Ok(config)
    }
}

fn parse_count(field: &str, value: &str) -> ConfigResult<usize> {
    let n = value
        .trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a count: {}", value, e),
        })?;
    validate_positive(field, n)?;
    Ok(n)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    /// Number of suites run at once (config > default of 1)
    pub fn suite_concurrency(&self) -> usize {
        self.project
            .suite_concurrency()
            .unwrap_or(DEFAULT_SUITE_CONCURRENCY)
    }

    /// Summaries per result-store page
    pub fn page_size(&self) -> usize {
        self.project.page_size().unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Report output format
    pub fn format(&self) -> ReportFormat {
        self.project.format().unwrap_or_default()
    }

    /// Whether to report every test rather than only failures
    pub fn verbose(&self) -> bool {
        self.project
            .report
            .as_ref()
            .and_then(|r| r.verbose)
            .unwrap_or(false)
    }

    /// Whether colored output is enabled
    pub fn color(&self) -> bool {
        self.project
            .report
            .as_ref()
            .and_then(|r| r.color)
            .unwrap_or(true)
    }

    /// Directory containing trellis.toml, if one was found
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }
}
