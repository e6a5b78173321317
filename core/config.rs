/*!
This module defines the `Config` struct, which is read once from a YAML file when a stage starts and passed by reference to every stage.

```yaml
pre_process:
  chunk_size: 10000
  target_col: is_top_decile
train:
  loss: log
  use_text_cols: false
  use_number_category_cols: true
```
*/

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use upvote_features::TfidfSettings;
use upvote_linear::{Loss, TrainOptions};

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct Config {
	pub pre_process: PreProcessConfig,
	pub train: TrainConfig,
	#[serde(default)]
	pub paths: PathsConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct PreProcessConfig {
	/// The number of rows read, transformed and written at a time.
	pub chunk_size: usize,
	/// The binary label column to stratify on and predict.
	pub target_col: String,
	#[serde(default = "default_test_fraction")]
	pub test_fraction: f32,
	#[serde(default = "default_random_seed")]
	pub random_seed: u64,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct TrainConfig {
	pub loss: Loss,
	pub use_text_cols: bool,
	pub use_number_category_cols: bool,
	pub learning_rate: Option<f32>,
	pub l2_regularization: Option<f32>,
	pub n_examples_per_batch: Option<usize>,
	pub max_features: Option<usize>,
}

/// Paths are relative to the storage root unless they are absolute.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
pub struct PathsConfig {
	pub storage_root: Option<PathBuf>,
	pub raw: Option<PathBuf>,
	pub train: Option<PathBuf>,
	pub test: Option<PathBuf>,
	pub models_dir: Option<PathBuf>,
}

fn default_test_fraction() -> f32 {
	0.25
}

fn default_random_seed() -> u64 {
	42
}

/// Which columns the classifier is trained on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSource {
	NumberCategory,
	Text,
	/// The number and category columns followed by the text features.
	Combined,
}

impl FeatureSource {
	pub fn uses_number_category(self) -> bool {
		matches!(self, FeatureSource::NumberCategory | FeatureSource::Combined)
	}

	pub fn uses_text(self) -> bool {
		matches!(self, FeatureSource::Text | FeatureSource::Combined)
	}

	pub fn description(self) -> &'static str {
		match self {
			FeatureSource::NumberCategory => "numerical + categorical",
			FeatureSource::Text => "text",
			FeatureSource::Combined => "numerical + categorical + text",
		}
	}
}

impl Config {
	/// Read, parse and validate the config file at `path`.
	pub fn from_path(path: &Path) -> Result<Config> {
		let config = std::fs::read_to_string(path).map_err(|error| {
			Error::Config(format!(
				"failed to read config file \"{}\": {}",
				path.display(),
				error
			))
		})?;
		Config::from_yaml(&config).map_err(|error| match error {
			Error::Config(message) => {
				Error::Config(format!("\"{}\": {}", path.display(), message))
			}
			error => error,
		})
	}

	/// Parse and validate a config from a YAML string.
	pub fn from_yaml(yaml: &str) -> Result<Config> {
		let config: Config =
			serde_yaml::from_str(yaml).map_err(|error| Error::Config(error.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		let pre_process = &self.pre_process;
		if pre_process.chunk_size == 0 {
			return Err(Error::Config(
				"pre_process.chunk_size must be positive".to_owned(),
			));
		}
		if pre_process.target_col.is_empty() {
			return Err(Error::Config(
				"pre_process.target_col must not be empty".to_owned(),
			));
		}
		if !(pre_process.test_fraction > 0.0 && pre_process.test_fraction < 1.0) {
			return Err(Error::Config(format!(
				"pre_process.test_fraction must be between 0 and 1, got {}",
				pre_process.test_fraction
			)));
		}
		let train = &self.train;
		if !train.use_text_cols && !train.use_number_category_cols {
			return Err(Error::Config(
				"at least one of train.use_text_cols and train.use_number_category_cols must be true"
					.to_owned(),
			));
		}
		if let Some(learning_rate) = train.learning_rate {
			if !(learning_rate.is_finite() && learning_rate > 0.0) {
				return Err(Error::Config(format!(
					"train.learning_rate must be positive, got {}",
					learning_rate
				)));
			}
		}
		if let Some(l2_regularization) = train.l2_regularization {
			if !(l2_regularization.is_finite() && l2_regularization >= 0.0) {
				return Err(Error::Config(format!(
					"train.l2_regularization must not be negative, got {}",
					l2_regularization
				)));
			}
		}
		if train.n_examples_per_batch == Some(0) {
			return Err(Error::Config(
				"train.n_examples_per_batch must be positive".to_owned(),
			));
		}
		if train.max_features == Some(0) {
			return Err(Error::Config(
				"train.max_features must be positive".to_owned(),
			));
		}
		Ok(())
	}

	pub fn feature_source(&self) -> FeatureSource {
		match (self.train.use_number_category_cols, self.train.use_text_cols) {
			(true, true) => FeatureSource::Combined,
			(false, true) => FeatureSource::Text,
			_ => FeatureSource::NumberCategory,
		}
	}

	pub fn train_options(&self) -> TrainOptions {
		let defaults = TrainOptions::default();
		TrainOptions {
			learning_rate: self.train.learning_rate.unwrap_or(defaults.learning_rate),
			l2_regularization: self
				.train
				.l2_regularization
				.unwrap_or(defaults.l2_regularization),
			n_examples_per_batch: self.train.n_examples_per_batch,
		}
	}

	pub fn tfidf_settings(&self) -> TfidfSettings {
		TfidfSettings {
			max_features: self.train.max_features,
			..Default::default()
		}
	}
}

#[cfg(test)]
const MINIMAL_CONFIG: &str = "
pre_process:
  chunk_size: 100
  target_col: is_top_decile
train:
  loss: log
  use_text_cols: false
  use_number_category_cols: true
";

#[test]
fn test_defaults() {
	let config = Config::from_yaml(MINIMAL_CONFIG).unwrap();
	assert_eq!(config.pre_process.test_fraction, 0.25);
	assert_eq!(config.pre_process.random_seed, 42);
	assert_eq!(config.paths, PathsConfig::default());
	assert_eq!(config.feature_source(), FeatureSource::NumberCategory);
	assert_eq!(config.train_options(), TrainOptions::default());
}

#[test]
fn test_feature_source_and_loss_alias() {
	let yaml = MINIMAL_CONFIG
		.replace("loss: log", "loss: log_loss")
		.replace("use_text_cols: false", "use_text_cols: true");
	let config = Config::from_yaml(&yaml).unwrap();
	assert_eq!(config.train.loss, Loss::Log);
	assert_eq!(config.feature_source(), FeatureSource::Combined);
	let yaml = yaml.replace(
		"use_number_category_cols: true",
		"use_number_category_cols: false",
	);
	let config = Config::from_yaml(&yaml).unwrap();
	assert_eq!(config.feature_source(), FeatureSource::Text);
}

#[test]
fn test_invalid_configs() {
	let invalid = vec![
		MINIMAL_CONFIG.replace("chunk_size: 100", "chunk_size: 0"),
		MINIMAL_CONFIG.replace("chunk_size: 100", "chunk_size: -3"),
		MINIMAL_CONFIG.replace("  target_col: is_top_decile\n", ""),
		MINIMAL_CONFIG.replace("loss: log", "loss: hinge"),
		MINIMAL_CONFIG.replace(
			"use_number_category_cols: true",
			"use_number_category_cols: false",
		),
		MINIMAL_CONFIG.replace(
			"target_col: is_top_decile",
			"target_col: is_top_decile\n  test_fraction: 1.5",
		),
		MINIMAL_CONFIG.replace("loss: log", "loss: log\n  learning_rate: 0"),
		"pre_process: [".to_owned(),
	];
	for yaml in invalid {
		assert!(
			matches!(Config::from_yaml(&yaml), Err(Error::Config(_))),
			"{}",
			yaml
		);
	}
}

#[test]
fn test_missing_config_file() {
	let error = Config::from_path(Path::new("does/not/exist/params.yaml")).unwrap_err();
	assert!(matches!(error, Error::Config(_)));
}
