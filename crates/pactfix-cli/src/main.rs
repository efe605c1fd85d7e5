//! pactfix CLI tool.
//!
//! Usage:
//! ```bash
//! pactfix check [OPTIONS] [PATHS]...
//! pactfix fix [OPTIONS] [PATHS]...
//! pactfix list-rules
//! pactfix init
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pactfix::Language;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;
mod discovery;

use commands::Status;

/// Static analysis with safe mechanical fixes for source code, shell
/// scripts, Dockerfiles, SQL and YAML
#[derive(Parser)]
#[command(name = "pactfix")]
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
    /// Report diagnostics without changing files
    Check {
        #[command(flatten)]
        target: TargetArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Apply mechanical fixes and report what is left
    Fix {
        #[command(flatten)]
        target: TargetArgs,

        /// Show the rewrites without writing files
        #[arg(long)]
        dry_run: bool,

        /// Insert a comment above every fixed line
        #[arg(long)]
        annotate: bool,

        /// Maximum fix passes per file
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        max_passes: Option<u16>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List available rules
    ListRules {
        /// Only list rules for these languages
        #[arg(short, long, value_parser = parse_language)]
        language: Vec<Language>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: ListFormat,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Files and rules a run covers.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Files or directories to analyze (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Only run specific rules (comma-separated ids or names)
    #[arg(long)]
    pub rules: Option<String>,

    /// Exclude patterns (can be specified multiple times)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Only analyze files of these languages
    #[arg(short, long, value_parser = parse_language)]
    pub language: Vec<Language>,

    /// Analyze every file as this language instead of detecting it
    #[arg(long, value_parser = parse_language)]
    pub force_language: Option<Language>,
}

/// Output format for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-diagnostic compact format.
    Compact,
    /// Annotated source excerpts.
    Pretty,
}

/// Output format for the rule listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ListFormat {
    /// Table.
    #[default]
    Text,
    /// JSON array.
    Json,
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::from_id(&value.to_ascii_lowercase()).ok_or_else(|| {
        let known: Vec<&str> = Language::ALL.iter().map(|l| l.id()).collect();
        format!("unknown language `{value}` (expected one of {})", known.join(", "))
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Reports go to stdout; logs stay on stderr and quiet by default.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            Status::Failure.into()
        }
    }
}

fn run(cli: Cli) -> Result<Status> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Check { target, format } => commands::check::run(&target, format, config),
        Commands::Fix {
            target,
            dry_run,
            annotate,
            max_passes,
            format,
        } => {
            let options = commands::fix::FixOptions {
                dry_run,
                annotate,
                max_passes: max_passes.map(usize::from),
                format,
            };
            commands::fix::run(&target, &options, config)
        }
        Commands::ListRules { language, format } => {
            commands::list_rules::run(&language, format, config)
        }
        Commands::Init { force } => commands::init::run(std::path::Path::new("."), force),
    }
}
