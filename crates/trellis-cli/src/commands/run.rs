//! Run command - execute suites and report the result tree

use crate::testing::{demo, TestReporter};
use anyhow::{Context, Result};
use std::path::PathBuf;
use trellis_config::{Config, ConfigLoader, ReportFormat};
use trellis_engine::{Engine, EngineConfig, InMemoryStore, Results};

/// Arguments for the run command
#[derive(Debug, Default)]
pub struct RunArgs {
    /// Output the result tree as JSON
    pub json: bool,
    /// Report every node, not only failures
    pub verbose: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Override the configured suite concurrency
    pub suite_concurrency: Option<usize>,
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Register the failure-reporting suite too
    pub with_failures: bool,
}

/// Load configuration from `--config` or by searching upward from the
/// current directory.
pub fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let loader = ConfigLoader::new();
    let config = match path {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => loader.load_from_directory(&std::env::current_dir()?)?,
    };
    if let Some(root) = config.project_root() {
        log::info!("using configuration from {}", root.display());
    }
    Ok(config)
}

/// Run the demonstration suites. Returns whether every test passed.
pub fn run(args: RunArgs) -> Result<bool> {
    let config = load_config(args.config.as_ref())?;

    // Command-line flags override trellis.toml and TRELLIS_* variables
    let json = args.json || config.format() == ReportFormat::Json;
    let verbose = args.verbose || config.verbose();
    let no_color = args.no_color || !config.color();
    let mut engine_config = EngineConfig::from(&config);
    if let Some(n) = args.suite_concurrency {
        engine_config.suite_concurrency = n;
    }

    let registry = demo::registry(args.with_failures);
    let root = Engine::new(engine_config).run(&registry);
    let passed = root.passed();

    let mut results = Results::with_store(InMemoryStore::with_page_size(config.page_size()));
    let id = results.save_result(root)?;
    let root = results.load_result(&id)?;

    if json {
        println!("{}", root.to_json()?);
    } else {
        let (summaries, _) = results.enumerate(1)?;
        let summary = summaries
            .into_iter()
            .find(|s| s.id == id)
            .context("saved run missing from result listing")?;
        TestReporter::new(verbose)
            .with_no_color(no_color)
            .report(&root, &summary);
    }

    Ok(passed)
}
