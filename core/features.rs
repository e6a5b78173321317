use crate::{
	config::FeatureSource,
	schema::{dense_feature_column_names, TEXT_FEATURE_COLUMN},
	Error, Result,
};
use upvote_dataframe::DataFrame;
use upvote_features::{dense_features, FeatureMatrix, TfidfVectorizer};

/// Read the binary target column. Every value must be 0 or 1.
pub fn labels(dataframe: &DataFrame, target_column: &str) -> Result<Vec<usize>> {
	let column = dataframe.number_column(target_column)?;
	column
		.data
		.iter()
		.zip(dataframe.index.iter())
		.map(|(value, row)| {
			if *value == 0.0 {
				Ok(0)
			} else if *value == 1.0 {
				Ok(1)
			} else {
				Err(Error::Schema(format!(
					"target column \"{}\" has value {} in row {}, expected 0 or 1",
					target_column, value, row
				)))
			}
		})
		.collect()
}

/// The text documents of a processed chunk.
pub fn documents(dataframe: &DataFrame) -> Result<impl Iterator<Item = &str>> {
	Ok(dataframe.text_column(TEXT_FEATURE_COLUMN)?.iter_or_empty())
}

/// A `FeatureBuilder` turns processed chunks into the feature matrix for one feature source.
pub struct FeatureBuilder<'a> {
	source: FeatureSource,
	vectorizer: Option<&'a TfidfVectorizer>,
}

impl<'a> FeatureBuilder<'a> {
	/// A vectorizer is required when the source uses text features.
	pub fn new(source: FeatureSource, vectorizer: Option<&'a TfidfVectorizer>) -> Result<Self> {
		if source.uses_text() && vectorizer.is_none() {
			return Err(Error::Config(format!(
				"the {} feature source needs a fitted vectorizer",
				source.description()
			)));
		}
		Ok(Self { source, vectorizer })
	}

	pub fn feature_names(&self) -> Vec<String> {
		let mut names = Vec::new();
		if self.source.uses_number_category() {
			names.extend(dense_feature_column_names().into_iter().map(str::to_owned));
		}
		if let (true, Some(vectorizer)) = (self.source.uses_text(), self.vectorizer) {
			names.extend(
				vectorizer
					.tokens()
					.iter()
					.map(|entry| format!("{}[{}]", TEXT_FEATURE_COLUMN, entry.token)),
			);
		}
		names
	}

	pub fn n_features(&self) -> usize {
		let mut n_features = 0;
		if self.source.uses_number_category() {
			n_features += dense_feature_column_names().len();
		}
		if let (true, Some(vectorizer)) = (self.source.uses_text(), self.vectorizer) {
			n_features += vectorizer.vocabulary_len();
		}
		n_features
	}

	pub fn build(&self, dataframe: &DataFrame) -> Result<FeatureMatrix> {
		let dense = if self.source.uses_number_category() {
			Some(dense_features(dataframe, &dense_feature_column_names())?)
		} else {
			None
		};
		let sparse = match (self.source.uses_text(), self.vectorizer) {
			(true, Some(vectorizer)) => Some(vectorizer.transform(documents(dataframe)?)),
			_ => None,
		};
		match (dense, sparse) {
			(Some(dense), Some(sparse)) => Ok(FeatureMatrix::stack(dense, sparse)),
			(Some(dense), None) => Ok(FeatureMatrix::Dense(dense)),
			(None, Some(sparse)) => Ok(FeatureMatrix::Sparse(sparse)),
			(None, None) => Err(Error::Config("no feature source selected".to_owned())),
		}
	}
}

#[cfg(test)]
fn processed_chunk() -> DataFrame {
	use upvote_dataframe::{Column, NumberColumn, TextColumn};
	let mut columns: Vec<Column> = dense_feature_column_names()
		.into_iter()
		.enumerate()
		.map(|(i, name)| {
			Column::Number(NumberColumn::new(
				name.to_owned(),
				vec![i as f32, 0.0],
			))
		})
		.collect();
	columns.push(Column::Text(TextColumn::new(
		TEXT_FEATURE_COLUMN.to_owned(),
		vec![Some("rust is fast".to_owned()), None],
	)));
	columns.push(Column::Number(NumberColumn::new(
		"is_top_decile".to_owned(),
		vec![1.0, 0.0],
	)));
	DataFrame::new(vec![10, 11], columns)
}

#[test]
fn test_feature_sources() {
	let chunk = processed_chunk();
	let mut vectorizer = TfidfVectorizer::new(Default::default());
	vectorizer.fit_first(documents(&chunk).unwrap()).unwrap();
	assert_eq!(vectorizer.vocabulary_len(), 3);

	let builder = FeatureBuilder::new(FeatureSource::NumberCategory, None).unwrap();
	let matrix = builder.build(&chunk).unwrap();
	assert_eq!((matrix.nrows(), matrix.ncols()), (2, 16));
	assert!(matches!(matrix, FeatureMatrix::Dense(_)));

	let builder = FeatureBuilder::new(FeatureSource::Text, Some(&vectorizer)).unwrap();
	assert_eq!(builder.build(&chunk).unwrap().ncols(), 3);
	assert_eq!(builder.feature_names()[0], "title_and_body[fast]");

	let builder = FeatureBuilder::new(FeatureSource::Combined, Some(&vectorizer)).unwrap();
	let matrix = builder.build(&chunk).unwrap();
	assert_eq!(matrix.ncols(), 19);
	assert_eq!(builder.n_features(), 19);
	assert_eq!(builder.feature_names().len(), 19);
	assert_eq!(builder.feature_names()[0], "title_len");

	assert!(matches!(
		FeatureBuilder::new(FeatureSource::Text, None),
		Err(Error::Config(_))
	));
}

#[test]
fn test_labels() {
	let mut chunk = processed_chunk();
	assert_eq!(labels(&chunk, "is_top_decile").unwrap(), vec![1, 0]);
	assert!(matches!(labels(&chunk, "is_top_percent"), Err(Error::Schema(_))));
	chunk.number_column_mut("is_top_decile").unwrap().data[1] = std::f32::NAN;
	assert!(matches!(labels(&chunk, "is_top_decile"), Err(Error::Schema(_))));
}
