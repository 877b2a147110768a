//! infralint CLI tool.
//!
//! Usage:
//! ```bash
//! infralint check [OPTIONS] [PATHS]...
//! infralint list-rules
//! infralint init [--force]
//! ```
//!
//! Exit codes: `0` no errors, `1` at least one `ERROR` diagnostic, `2`
//! fatal (nothing could be processed, unusable config or rule table).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use infralint_core::{AnalyzerError, FatalRunError, Severity};
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Rule-based checker for Dockerfiles, Makefiles, .env files, crontabs and
/// systemd units
#[derive(Parser)]
#[command(name = "infralint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files and directories
    Check {
        /// Files or directories to check (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Number of files checked at once (default: available CPUs)
        #[arg(short = 'j', long)]
        parallelism: Option<usize>,

        /// Abort the run after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Largest file to load, in bytes
        #[arg(long, value_name = "BYTES")]
        max_file_size: Option<u64>,

        /// Exclude patterns for directory walks (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Override a rule's severity
        #[arg(long = "severity", value_name = "RULE=LEVEL", value_parser = commands::check::parse_severity_override)]
        severities: Vec<(String, Severity)>,

        /// Disable a rule
        #[arg(long, value_name = "RULE")]
        disable: Vec<String>,

        /// Enable a rule
        #[arg(long, value_name = "RULE")]
        enable: Vec<String>,

        /// Set an option, e.g. `env.min_secret_length=12`
        #[arg(long = "set", value_name = "SECTION.KEY=VALUE", value_parser = commands::check::parse_option_override)]
        options: Vec<(String, toml::Value)>,
    },

    /// List available rules and their effective settings
    ListRules,

    /// Create an infralint.toml in the current directory
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-diagnostic compact format.
    Compact,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            report(err);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let cwd = std::env::current_dir()?;
    let source = config_resolver::resolve(&cwd, cli.config.as_deref());

    match cli.command {
        Commands::Check {
            paths,
            format,
            parallelism,
            timeout,
            max_file_size,
            exclude,
            severities,
            disable,
            enable,
            options,
        } => {
            let args = commands::check::CheckArgs {
                paths,
                format,
                parallelism,
                timeout,
                max_file_size,
                exclude,
                overrides: infralint_core::Overrides {
                    severities,
                    disabled: disable,
                    enabled: enable,
                    options,
                },
            };
            commands::check::run(args, &source).await
        }
        Commands::ListRules => {
            commands::list_rules::run(&source)?;
            Ok(0)
        }
        Commands::Init { force } => {
            commands::init::run(&cwd, force)?;
            Ok(0)
        }
    }
}

/// Prints a fatal error, through miette when it carries diagnostic metadata.
fn report(err: anyhow::Error) {
    let err = match err.downcast::<FatalRunError>() {
        Ok(fatal) => {
            eprintln!("{:?}", miette::Report::new(fatal));
            return;
        }
        Err(other) => other,
    };
    match err.downcast::<AnalyzerError>() {
        Ok(analyzer) => eprintln!("{:?}", miette::Report::new(analyzer)),
        Err(other) => eprintln!("Error: {other:#}"),
    }
}
