use crate::{
	config::Config,
	features::{labels, FeatureBuilder},
	model::{Artifact, ModelArtifact},
	report::{metrics_report, write_yaml},
	schema::processed_csv_options,
	storage::DataPaths,
	Error, Result,
};
use upvote_dataframe::CsvSource;
use upvote_features::TfidfVectorizer;
use upvote_linear::BinaryClassifier;
use upvote_metrics::{
	BinaryClassificationMetrics, BinaryClassificationMetricsInput,
	BinaryClassificationMetricsOutput, StreamingMetric,
};

#[derive(Clone, Debug, PartialEq)]
pub struct EvaluateSummary {
	pub n_examples: usize,
	pub metrics: BinaryClassificationMetricsOutput,
}

/**
Load the persisted model, score every chunk of the test table and write the test metrics report. The model must have been trained with the feature source and target column the config selects.
*/
pub fn evaluate(config: &Config, paths: &DataPaths) -> Result<EvaluateSummary> {
	let model = ModelArtifact::from_path(&paths.model)?;
	let feature_source = config.feature_source();
	if model.feature_source != feature_source {
		return Err(Error::Config(format!(
			"the model was trained on {} features but the config selects {} features",
			model.feature_source.description(),
			feature_source.description()
		)));
	}
	if model.target_column_name != config.pre_process.target_col {
		return Err(Error::Config(format!(
			"the model predicts \"{}\" but the config targets \"{}\"",
			model.target_column_name, config.pre_process.target_col
		)));
	}
	let vectorizer = if feature_source.uses_text() {
		Some(TfidfVectorizer::from_path(&paths.tfidf)?)
	} else {
		None
	};
	let builder = FeatureBuilder::new(feature_source, vectorizer.as_ref())?;
	if builder.n_features() != model.classifier.n_features() {
		return Err(Error::Artifact {
			path: paths.tfidf.clone(),
			message: format!(
				"the vectorizer produces {} features but the model expects {}",
				builder.n_features(),
				model.classifier.n_features()
			),
		});
	}
	let source = CsvSource::new(
		paths.test.clone(),
		config.pre_process.chunk_size,
		processed_csv_options(),
	);
	let (n_examples, metrics) = score_chunks(
		&source,
		&builder,
		&model.classifier,
		&model.target_column_name,
	)?;
	write_yaml(&paths.test_metrics, &metrics_report(&metrics, Some("test")))?;
	tracing::info!(
		n_examples,
		roc_auc = metrics.roc_auc,
		accuracy = metrics.accuracy,
		"evaluated model"
	);
	Ok(EvaluateSummary {
		n_examples,
		metrics,
	})
}

/// Run the classifier over every chunk of `source` and compute the metrics of the whole pass.
pub(crate) fn score_chunks(
	source: &CsvSource,
	builder: &FeatureBuilder,
	classifier: &BinaryClassifier,
	target_column: &str,
) -> Result<(usize, BinaryClassificationMetricsOutput)> {
	let mut metrics = BinaryClassificationMetrics::new();
	for (chunk_index, chunk) in source.chunks()?.enumerate() {
		let chunk = chunk?;
		let features = builder.build(&chunk)?;
		let labels = labels(&chunk, target_column)?;
		let probabilities = classifier.predict_proba(&features)?.to_vec();
		let predictions = classifier.predict(&features)?;
		metrics.update(BinaryClassificationMetricsInput {
			labels: &labels,
			predictions: &predictions,
			probabilities: &probabilities,
		});
		tracing::debug!(chunk_index, n_rows = chunk.nrows(), "scored chunk");
	}
	let n_examples = metrics.n_examples();
	Ok((n_examples, metrics.finalize()?))
}
