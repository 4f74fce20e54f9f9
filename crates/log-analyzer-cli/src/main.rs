use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log_analyzer_cli::OutputFormat;
use log_analyzer_cli::commands;
use log_analyzer_core::pipeline::Selection;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "log-analyzer")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Builds latency reports from rotated nginx access logs",
    long_about = "log-analyzer reads nginx-access-ui.log-YYYYMMDD[.gz] files, aggregates request \
                  times per URL, and writes an HTML report for each log date."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, table, pretty)
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Write reports for logs that have none yet
    Run {
        /// YAML config file overriding the defaults
        #[arg(short, long, value_name = "FILE", env = "LOG_ANALYZER_CONFIG")]
        config: Option<PathBuf>,

        /// Process every pending log instead of only the most recent one
        #[arg(long)]
        all: bool,
    },

    /// Display statistics for a single log file
    Stats {
        /// Path to the log file (plain or gzip)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of slowest URLs to show
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config: path, all } => {
            let loaded = commands::run::read_config(path.as_deref())?;
            init_logging(cli.verbose, loaded.config.logging_file.as_deref())?;
            if let Some(path) = &path {
                tracing::info!("Loaded config from {}", path.display());
            }
            loaded.warn_rejected();
            tracing::debug!("Output format: {}", cli.format.as_str());

            let selection = if all { Selection::All } else { Selection::Latest };
            commands::run::execute(&loaded.config, selection, cli.format)?;
            Ok(())
        }
        Commands::Stats { file, top } => {
            init_logging(cli.verbose, None)?;
            commands::stats::execute(&file, top, cli.format)
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `--verbose` when it is set.
fn init_logging(verbose: bool, logging_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt::time::ChronoLocal;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("log_analyzer=debug,log_analyzer_cli=debug,log_analyzer_core=debug")
        } else {
            EnvFilter::new("log_analyzer=info,log_analyzer_cli=info,log_analyzer_core=info")
        }
    });
    let timer = ChronoLocal::new("%Y.%m.%d %H:%M:%S".to_string());

    match logging_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(timer)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(timer)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}
