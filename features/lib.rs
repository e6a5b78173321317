/*!
This crate turns processed dataframes into the numeric matrices the classifier trains on. Number and flag columns are gathered into dense arrays, categorical columns are one hot encoded against a fixed set of options, and text is vectorized with a [`TfidfVectorizer`] that can keep learning from one chunk to the next.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod matrix;
mod one_hot;
mod sparse;
mod tfidf;

pub use self::matrix::{dense_features, FeatureMatrix};
pub use self::one_hot::{OneHotEncoder, OneHotEncoderOutput};
pub use self::sparse::CsrMatrix;
pub use self::tfidf::{TfidfSettings, TfidfToken, TfidfVectorizer};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("cannot fit a vectorizer on documents that contain no tokens")]
	EmptyVocabulary,
	#[error("the vectorizer must be fitted before it can be updated")]
	NotFitted,
	#[error("column \"{column}\" has a missing or non-finite value in row {row}")]
	NonFiniteValue { column: String, row: u64 },
	#[error(transparent)]
	Column(#[from] upvote_dataframe::Error),
}
