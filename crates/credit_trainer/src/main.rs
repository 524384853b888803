//! Credit scoring trainer CLI
//!
//! Trains one classifier kind from a CSV dataset and writes a new
//! versioned artifact bundle.

use anyhow::{Context, Result};
use clap::Parser;
use credit_trainer::{
    write_bundle, Dataset, ForestConfig, LogisticConfig, ModelKind, Trainer, TrainingParams,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "credit-train")]
#[command(author = "QuantumFinance Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a credit scoring model and write an artifact bundle", long_about = None)]
struct Args {
    /// Input CSV dataset path
    #[arg(short, long)]
    input: PathBuf,

    /// Models directory receiving the new bundle
    #[arg(short, long, default_value = "models")]
    output: PathBuf,

    /// Classifier kind: random-forest or logistic
    #[arg(short, long, default_value = "random-forest")]
    model: ModelKind,

    /// Number of trees (random forest)
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value = "20")]
    max_depth: usize,

    /// Minimum samples to split a node
    #[arg(long, default_value = "5")]
    min_samples_split: usize,

    /// Minimum samples per leaf
    #[arg(long, default_value = "2")]
    min_samples_leaf: usize,

    /// Seed for the split and the forest
    #[arg(long, default_value = "42")]
    seed: i64,

    /// Held-out fraction
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Gradient descent epochs (logistic)
    #[arg(long, default_value = "500")]
    epochs: usize,

    /// Gradient descent step size (logistic)
    #[arg(long, default_value = "0.1")]
    learning_rate: f64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Credit scoring trainer v{}", credit_trainer::VERSION);

    info!("Loading dataset from: {}", args.input.display());
    let dataset = Dataset::from_csv(&args.input).context("Failed to load dataset")?;
    info!("Loaded {} labelled rows", dataset.len());
    for (label, count) in dataset.label_counts() {
        info!("  {}: {}", label, count);
    }

    let params = TrainingParams {
        kind: args.model,
        test_size: args.test_size,
        split_seed: args.seed,
        forest: ForestConfig {
            n_trees: args.trees,
            max_depth: args.max_depth,
            min_samples_split: args.min_samples_split,
            min_samples_leaf: args.min_samples_leaf,
            max_features: None,
            seed: args.seed,
        },
        logistic: LogisticConfig {
            epochs: args.epochs,
            learning_rate: args.learning_rate,
            ..LogisticConfig::default()
        },
    };

    info!("Training {} model", params.kind);
    let trained = Trainer::new(params)
        .train(&dataset)
        .context("Training failed")?;
    info!(
        "Training complete: {} train rows, {} held out",
        trained.train_rows, trained.test_rows
    );
    if let Some(metrics) = &trained.metrics {
        info!("  Accuracy:  {:.4}", metrics.accuracy);
        info!("  Precision: {:.4}", metrics.precision);
        info!("  Recall:    {:.4}", metrics.recall);
        info!("  F1 score:  {:.4}", metrics.f1_score);
    }

    let bundle = write_bundle(&args.output, &trained).context("Failed to write bundle")?;
    info!("Bundle written to: {}", bundle.display());

    Ok(())
}
