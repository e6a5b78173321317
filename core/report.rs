use crate::{config::FeatureSource, storage::create_parent_dir, Error, Result};
use std::{collections::BTreeMap, path::Path};
use upvote_linear::BinaryClassifier;
use upvote_metrics::BinaryClassificationMetricsOutput;

/// A flat report of metric names to values, with values rounded to 4 decimal places.
pub type MetricsReport = BTreeMap<String, f64>;

pub fn metrics_report(
	metrics: &BinaryClassificationMetricsOutput,
	prefix: Option<&str>,
) -> MetricsReport {
	let entries = [
		("roc_auc", metrics.roc_auc),
		("average_precision", metrics.average_precision),
		("accuracy", metrics.accuracy),
		("precision", metrics.precision),
		("recall", metrics.recall),
		("f1", metrics.f1),
	];
	entries
		.iter()
		.map(|(name, value)| (prefixed(prefix, name), round4(f64::from(*value))))
		.collect()
}

/// The feature type, model class and classifier parameters of a training run.
pub fn hyperparameter_log(
	feature_source: FeatureSource,
	classifier: &BinaryClassifier,
	max_features: Option<usize>,
) -> BTreeMap<String, serde_yaml::Value> {
	let options = &classifier.options;
	let mut log = BTreeMap::new();
	log.insert(
		"feature_type".to_owned(),
		feature_source.description().into(),
	);
	log.insert("model_class".to_owned(), "BinaryClassifier".into());
	let mut param = |name: &str, value: serde_yaml::Value| {
		log.insert(prefixed(Some("model"), name), value);
	};
	param("loss", classifier.loss.to_string().into());
	param("learning_rate", shortest_f64(options.learning_rate).into());
	param(
		"l2_regularization",
		shortest_f64(options.l2_regularization).into(),
	);
	param(
		"n_examples_per_batch",
		options
			.n_examples_per_batch
			.map_or(serde_yaml::Value::Null, |n| (n as u64).into()),
	);
	param("n_features", (classifier.n_features() as u64).into());
	if feature_source.uses_text() {
		param(
			"max_features",
			max_features.map_or(serde_yaml::Value::Null, |n| (n as u64).into()),
		);
	}
	log
}

/// Write `value` as YAML to the file at `path`, creating its directory if needed.
pub fn write_yaml<T>(path: &Path, value: &T) -> Result<()>
where
	T: serde::Serialize,
{
	let yaml = serde_yaml::to_string(value).map_err(|error| Error::io(path, error))?;
	create_parent_dir(path)?;
	std::fs::write(path, yaml).map_err(|error| Error::io(path, error))?;
	Ok(())
}

fn prefixed(prefix: Option<&str>, name: &str) -> String {
	match prefix {
		Some(prefix) => format!("{}__{}", prefix, name),
		None => name.to_owned(),
	}
}

fn round4(value: f64) -> f64 {
	(value * 10_000.0).round() / 10_000.0
}

/// Widen an `f32` to the `f64` with the same shortest decimal representation, so 0.01 is written as 0.01.
fn shortest_f64(value: f32) -> f64 {
	value
		.to_string()
		.parse()
		.unwrap_or_else(|_| f64::from(value))
}

#[cfg(test)]
fn test_metrics() -> BinaryClassificationMetricsOutput {
	BinaryClassificationMetricsOutput {
		roc_auc: 0.75,
		average_precision: 0.833_333_3,
		accuracy: 0.5,
		precision: 0.5,
		recall: 0.5,
		f1: 0.5,
	}
}

#[test]
fn test_metrics_report() {
	let report = metrics_report(&test_metrics(), Some("test"));
	let keys: Vec<&str> = report.keys().map(String::as_str).collect();
	insta::assert_debug_snapshot!(keys, @r###"
 [
     "test__accuracy",
     "test__average_precision",
     "test__f1",
     "test__precision",
     "test__recall",
     "test__roc_auc",
 ]
 "###);
	assert_eq!(report["test__average_precision"], 0.8333);
	let report = metrics_report(&test_metrics(), None);
	assert_eq!(report["roc_auc"], 0.75);
}

#[test]
fn test_write_yaml_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("metrics").join("train.yaml");
	let report = metrics_report(&test_metrics(), Some("train"));
	write_yaml(&path, &report).unwrap();
	let contents = std::fs::read_to_string(&path).unwrap();
	let parsed: MetricsReport = serde_yaml::from_str(&contents).unwrap();
	assert_eq!(parsed, report);
	assert!(contents.contains("train__average_precision: 0.8333"));
}

#[test]
fn test_hyperparameter_log() {
	use upvote_linear::{Loss, TrainOptions};
	let classifier = BinaryClassifier::new(
		20,
		Loss::ModifiedHuber,
		TrainOptions {
			learning_rate: 0.01,
			l2_regularization: 0.0001,
			n_examples_per_batch: None,
		},
	);
	let log = hyperparameter_log(FeatureSource::Combined, &classifier, Some(5000));
	assert_eq!(
		log["feature_type"],
		serde_yaml::Value::from("numerical + categorical + text")
	);
	assert_eq!(log["model__loss"], serde_yaml::Value::from("modified_huber"));
	assert_eq!(log["model__learning_rate"], serde_yaml::Value::from(0.01));
	assert_eq!(log["model__n_examples_per_batch"], serde_yaml::Value::Null);
	assert_eq!(log["model__max_features"], serde_yaml::Value::from(5000u64));
	let log = hyperparameter_log(FeatureSource::NumberCategory, &classifier, Some(5000));
	assert!(!log.contains_key("model__max_features"));
}
