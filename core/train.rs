use crate::{
	config::Config,
	evaluate::score_chunks,
	features::{documents, labels, FeatureBuilder},
	model::{Artifact, ModelArtifact},
	preprocess::check_target_column,
	report::{hyperparameter_log, metrics_report, write_yaml},
	schema::processed_csv_options,
	storage::DataPaths,
	Error, Result,
};
use upvote_dataframe::CsvSource;
use upvote_features::TfidfVectorizer;
use upvote_linear::{BinaryClassifier, CLASSES};
use upvote_metrics::BinaryClassificationMetricsOutput;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainSummary {
	pub n_chunks: usize,
	pub n_examples: usize,
	pub n_features: usize,
	pub vocabulary_len: Option<usize>,
	pub metrics: BinaryClassificationMetricsOutput,
}

/**
Train a classifier on the train table, one chunk at a time.

1. If text features are used, the vectorizer is fitted with one pass over the table, so that the vocabulary is complete before the classifier sees any text features.
2. The classifier is updated with one more pass, one `partial_fit` per chunk.
3. The model and vectorizer are written, then a last pass scores the training data and writes the training metrics and the hyperparameter log.
*/
pub fn train(config: &Config, paths: &DataPaths) -> Result<TrainSummary> {
	let feature_source = config.feature_source();
	let target_column = &config.pre_process.target_col;
	check_target_column(target_column)?;
	let source = CsvSource::new(
		paths.train.clone(),
		config.pre_process.chunk_size,
		processed_csv_options(),
	);

	let vectorizer = if feature_source.uses_text() {
		let mut vectorizer = TfidfVectorizer::new(config.tfidf_settings());
		for (chunk_index, chunk) in source.chunks()?.enumerate() {
			let chunk = chunk?;
			vectorizer.partial_fit(documents(&chunk)?)?;
			tracing::info!(
				chunk_index,
				vocabulary_len = vectorizer.vocabulary_len(),
				"fitted vectorizer on chunk"
			);
		}
		if !vectorizer.is_fitted() {
			return Err(empty_table_error(paths));
		}
		Some(vectorizer)
	} else {
		None
	};

	let builder = FeatureBuilder::new(feature_source, vectorizer.as_ref())?;
	let mut classifier = BinaryClassifier::new(
		builder.n_features(),
		config.train.loss,
		config.train_options(),
	);
	let mut n_chunks = 0;
	let mut n_examples = 0;
	for (chunk_index, chunk) in source.chunks()?.enumerate() {
		let chunk = chunk?;
		let features = builder.build(&chunk)?;
		let labels = labels(&chunk, target_column)?;
		classifier.partial_fit(&features, &labels, &CLASSES)?;
		n_chunks += 1;
		n_examples += labels.len();
		tracing::info!(chunk_index, n_rows = labels.len(), "fitted classifier on chunk");
	}
	if n_examples == 0 {
		return Err(empty_table_error(paths));
	}

	let model = ModelArtifact {
		feature_source,
		target_column_name: target_column.clone(),
		feature_names: builder.feature_names(),
		classifier,
	};
	model.to_path(&paths.model)?;
	if let Some(vectorizer) = vectorizer.as_ref() {
		vectorizer.to_path(&paths.tfidf)?;
	}
	tracing::info!(path = %paths.model.display(), "wrote model");

	let (_, metrics) = score_chunks(&source, &builder, &model.classifier, target_column)?;
	write_yaml(&paths.train_metrics, &metrics_report(&metrics, Some("train")))?;
	write_yaml(
		&paths.result,
		&hyperparameter_log(feature_source, &model.classifier, config.train.max_features),
	)?;
	tracing::info!(
		n_examples,
		roc_auc = metrics.roc_auc,
		accuracy = metrics.accuracy,
		"trained model"
	);
	Ok(TrainSummary {
		n_chunks,
		n_examples,
		n_features: builder.n_features(),
		vocabulary_len: vectorizer.as_ref().map(|vectorizer| vectorizer.vocabulary_len()),
		metrics,
	})
}

fn empty_table_error(paths: &DataPaths) -> Error {
	Error::Schema(format!(
		"the train table \"{}\" has no rows",
		paths.train.display()
	))
}
