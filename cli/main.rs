//! This module contains the main entrypoint to the upvote cli.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upvote_core::{Config, DataPaths, LocalStorageRoot};

#[derive(Parser)]
#[clap(
	about = "Predict which posts will be popular, one chunk at a time.",
	setting = clap::AppSettings::DisableHelpSubcommand,
)]
struct Options {
	/// the path to the yaml config file
	#[clap(short, long, default_value = "params.yaml", global = true)]
	config: PathBuf,
	#[clap(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// transform the raw table and split it into train and test tables
	#[clap(name = "preprocess")]
	Preprocess,
	/// fit the vectorizer and the classifier on the train table
	#[clap(name = "train")]
	Train,
	/// score the test table with the trained model
	#[clap(name = "evaluate")]
	Evaluate,
}

fn main() {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "upvote=info".into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
	let options = Options::parse();
	if let Err(error) = run(&options.config, options.command) {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn run(config_path: &Path, command: Command) -> Result<()> {
	let config = Config::from_path(config_path)?;
	let storage_root = LocalStorageRoot::from_config(&config.paths);
	let paths = DataPaths::resolve(&storage_root, &config.paths)
		.with_context(|| format!("failed to resolve the paths in {}", config_path.display()))?;
	match command {
		Command::Preprocess => {
			let summary = upvote_core::preprocess(&config, &paths)?;
			info!(
				n_chunks = summary.n_chunks,
				n_rows_read = summary.n_rows_read,
				n_rows_kept = summary.n_rows_kept,
				n_train_rows = summary.n_train_rows,
				n_test_rows = summary.n_test_rows,
				"preprocessing finished"
			);
			eprintln!(
				"The train and test tables were written to {} and {}.",
				paths.train.display(),
				paths.test.display()
			);
		}
		Command::Train => {
			let summary = upvote_core::train(&config, &paths)?;
			info!(
				n_chunks = summary.n_chunks,
				n_examples = summary.n_examples,
				n_features = summary.n_features,
				vocabulary_len = ?summary.vocabulary_len,
				roc_auc = summary.metrics.roc_auc,
				accuracy = summary.metrics.accuracy,
				"training finished"
			);
			eprintln!("Your model was written to {}.", paths.model.display());
		}
		Command::Evaluate => {
			let summary = upvote_core::evaluate(&config, &paths)?;
			info!(
				n_examples = summary.n_examples,
				roc_auc = summary.metrics.roc_auc,
				average_precision = summary.metrics.average_precision,
				accuracy = summary.metrics.accuracy,
				f1 = summary.metrics.f1,
				"evaluation finished"
			);
			eprintln!(
				"The test metrics were written to {}.",
				paths.test_metrics.display()
			);
		}
	}
	Ok(())
}
