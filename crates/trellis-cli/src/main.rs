use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod testing;

/// Trellis test orchestration runner.
///
/// Runs registered suites with their lifecycle hooks and reports the result
/// tree.
///
/// EXAMPLES:
///     trellis run                        Run every suite
///     trellis run --verbose              Show every test and subtest
///     trellis run --json                 Print the result tree as JSON
///     trellis list                       List suites and tests in run order
///
/// ENVIRONMENT VARIABLES:
///     TRELLIS_SUITE_CONCURRENCY  Suites run at the same time (default 1)
///     TRELLIS_FORMAT             'text' or 'json'
///     TRELLIS_VERBOSE            Set to '1' to report every test
///     TRELLIS_PAGE_SIZE          Summaries per result-store page
///     NO_COLOR                   Set to disable colored output
///     RUST_LOG                   Log filter (default 'warn')
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all suites and report the results
    ///
    /// Exits with code 1 if any test failed.
    ///
    /// EXAMPLES:
    ///     trellis run                          Run with trellis.toml settings
    ///     trellis run --suite-concurrency 4    Run up to 4 suites at once
    ///     trellis run --config ci/trellis.toml Use a specific config file
    #[command(visible_alias = "r")]
    Run {
        /// Print the result tree as JSON
        #[arg(long)]
        json: bool,
        /// Report every test and subtest, with messages
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        /// Number of suites run at the same time
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        suite_concurrency: Option<u16>,
        /// Path to a trellis.toml (default: search upward from the current directory)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
        /// Also run a suite that demonstrates failure reporting
        #[arg(long)]
        with_failures: bool,
    },

    /// List suites, hooks and tests in the order they run
    #[command(visible_alias = "ls")]
    List {
        /// Include the failure-reporting suite
        #[arg(long)]
        with_failures: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            json,
            verbose,
            no_color,
            suite_concurrency,
            config,
            with_failures,
        } => {
            init_logging(verbose);
            let args = commands::run::RunArgs {
                json,
                verbose,
                no_color,
                suite_concurrency: suite_concurrency.map(usize::from),
                config,
                with_failures,
            };
            if !commands::run::run(args)? {
                std::process::exit(1);
            }
        }
        Commands::List { with_failures } => {
            init_logging(false);
            commands::list::run(with_failures)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_smoke() {
        let _cli = Cli::parse_from(["trellis", "list"]);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "trellis",
            "run",
            "--json",
            "-v",
            "--suite-concurrency",
            "3",
        ]);
        match cli.command {
            Commands::Run {
                json,
                verbose,
                suite_concurrency,
                ..
            } => {
                assert!(json);
                assert!(verbose);
                assert_eq!(suite_concurrency, Some(3));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(Cli::try_parse_from(["trellis", "run", "--suite-concurrency", "0"]).is_err());
    }

    #[test]
    fn test_alias_r_for_run() {
        let cli = Cli::parse_from(["trellis", "r"]);
        assert!(matches!(cli.command, Commands::Run { .. }));
    }
}
