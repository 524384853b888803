//! Credit scoring command line interface
//!
//! Loads one artifact bundle at startup and scores applicants read from
//! JSON files. Results are printed to stdout as JSON; logs go to stderr.

mod input;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credit_core::health::HealthMonitor;
use credit_core::{CoreConfig, CreditScoringService, InferenceMetrics, ModelHandle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "credit-score")]
#[command(about = "Credit scoring command line interface", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Models directory (overrides configuration)
    #[arg(long, value_name = "DIR")]
    models_dir: Option<PathBuf>,

    /// Caller identity recorded on log spans
    #[arg(long, default_value = "cli")]
    identity: String,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one applicant
    Score {
        /// JSON file holding one applicant record
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Score a batch of applicants
    Batch {
        /// JSON file holding an array of applicants or {"predictions": [...]}
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Report model and pipeline health
    Health,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = CoreConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = &cli.models_dir {
        config.models.directory = dir.clone();
    }
    init_logging(&config, cli.verbose, cli.json_logs)?;
    info!(
        source = %config_source(cli.config.as_deref()),
        models_dir = %config.models.directory.display(),
        max_batch_size = config.batch.max_size,
        "configuration loaded"
    );

    match cli.command {
        Commands::Score { input } => {
            let record = input::read_applicant(&input)?;
            let service = load_service(&config)?;
            let result = service
                .score(&cli.identity, &record)
                .context("scoring failed")?;
            print_json(&result)?;
        }
        Commands::Batch { input } => {
            let records = input::read_batch(&input)?;
            let service = load_service(&config)?;
            let result = service
                .score_batch(&cli.identity, &records)
                .context("batch rejected")?;
            info!(
                total = result.total_processed,
                failed = result.failed,
                "batch complete"
            );
            print_json(&result)?;
        }
        Commands::Health => match CreditScoringService::from_config(&config) {
            Ok(service) => print_json(&service.health())?,
            Err(err) => {
                error!(error = %err, "model unavailable");
                let monitor = HealthMonitor::new(
                    Arc::new(ModelHandle::new()),
                    Arc::new(InferenceMetrics::new()),
                );
                print_json(&monitor.report())?;
                return Ok(ExitCode::FAILURE);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn load_service(config: &CoreConfig) -> Result<CreditScoringService> {
    CreditScoringService::from_config(config).with_context(|| {
        format!(
            "failed to load model bundle from {}",
            config.models.directory.display()
        )
    })
}

fn init_logging(config: &CoreConfig, verbose: bool, json: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json || config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

/// Where the configuration came from, for the startup log line
fn config_source(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "defaults".to_string(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_source_names_file_or_defaults() {
        assert_eq!(config_source(None), "defaults");
        assert_eq!(config_source(Some(Path::new("credit.toml"))), "credit.toml");
    }

    #[test]
    fn logging_can_be_installed_after_loading_config() {
        let config = CoreConfig::load(None).unwrap();
        assert!(init_logging(&config, true, false).is_ok());
        // A second subscriber is refused rather than silently replacing the first.
        assert!(init_logging(&config, false, false).is_err());
    }
}
