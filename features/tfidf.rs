use crate::{CsrMatrix, Error};
use fnv::{FnvHashMap, FnvHashSet};
use num_traits::ToPrimitive;
use std::collections::BTreeMap;
use upvote_util::word_tokenizer::WordTokenizer;

/**
A `TfidfVectorizer` turns documents into sparse [TF-IDF](https://en.wikipedia.org/wiki/Tf%E2%80%93idf) features, and unlike a batch vectorizer it can keep learning from new chunks of documents after the first fit.

The first chunk is fitted with [`fit_first`](#method.fit_first), which builds the vocabulary from scratch and assigns token indices in sorted token order. Every later chunk is fitted with [`fit_update`](#method.fit_update), which appends unseen tokens to the end of the vocabulary, so indices that were handed out once never change. [`partial_fit`](#method.partial_fit) picks the right one.

The idf of a token is the smoothed `ln((n_documents + 1) / (document_frequency + 1)) + 1`. Only idf values are stored. On update, each document frequency is recovered by inverting this formula, incremented with the new chunk's counts, and the idf of every token is recomputed, so a sequence of updates reaches the same idf values as one batch fit over all the documents seen.

# Example

| documents            | vocabulary                                            |
|----------------------|-------------------------------------------------------|
| "The Little Prince"  | cat, hat, in, little, prince, stuart, the             |
| "Stuart Little"      |                                                       |
| "The Cat in the Hat" |                                                       |

| token    | idf             |
|----------|-----------------|
| "cat"    | ln(4 / 2) + 1   |
| "little" | ln(4 / 3) + 1   |
| "the"    | ln(4 / 3) + 1   |
*/
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "TfidfVectorizerData")]
pub struct TfidfVectorizer {
	settings: TfidfSettings,
	tokens: Vec<TfidfToken>,
	n_documents: u64,
	fitted: bool,
	#[serde(skip)]
	tokens_map: FnvHashMap<String, usize>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TfidfSettings {
	/// Lowercase tokens before looking them up.
	pub lowercase: bool,
	/// Keep at most this many tokens, chosen by corpus frequency, in the first fit.
	pub max_features: Option<usize>,
	/// Scale each transformed row to unit euclidean norm.
	pub normalize: bool,
}

impl Default for TfidfSettings {
	fn default() -> Self {
		Self {
			lowercase: true,
			max_features: None,
			normalize: true,
		}
	}
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TfidfToken {
	pub token: String,
	pub idf: f64,
}

#[derive(serde::Deserialize)]
struct TfidfVectorizerData {
	settings: TfidfSettings,
	tokens: Vec<TfidfToken>,
	n_documents: u64,
	fitted: bool,
}

impl From<TfidfVectorizerData> for TfidfVectorizer {
	fn from(data: TfidfVectorizerData) -> Self {
		let tokens_map = index_tokens(&data.tokens);
		Self {
			settings: data.settings,
			tokens: data.tokens,
			n_documents: data.n_documents,
			fitted: data.fitted,
			tokens_map,
		}
	}
}

fn index_tokens(tokens: &[TfidfToken]) -> FnvHashMap<String, usize> {
	tokens
		.iter()
		.enumerate()
		.map(|(index, entry)| (entry.token.clone(), index))
		.collect()
}

pub fn smoothed_idf(n_documents: u64, document_frequency: u64) -> f64 {
	let n_documents = n_documents.to_f64().unwrap_or(std::f64::MAX);
	let document_frequency = document_frequency.to_f64().unwrap_or(std::f64::MAX);
	((n_documents + 1.0) / (document_frequency + 1.0)).ln() + 1.0
}

/// Invert [`smoothed_idf`], rounding to the nearest whole document.
pub fn document_frequency_from_idf(n_documents: u64, idf: f64) -> u64 {
	let n_documents = n_documents.to_f64().unwrap_or(std::f64::MAX);
	let document_frequency = (n_documents + 1.0) / (idf - 1.0).exp() - 1.0;
	document_frequency.round().max(0.0).to_u64().unwrap_or(0)
}

impl TfidfVectorizer {
	pub fn new(settings: TfidfSettings) -> Self {
		Self {
			settings,
			tokens: Vec::new(),
			n_documents: 0,
			fitted: false,
			tokens_map: FnvHashMap::default(),
		}
	}

	pub fn settings(&self) -> &TfidfSettings {
		&self.settings
	}

	pub fn is_fitted(&self) -> bool {
		self.fitted
	}

	pub fn vocabulary_len(&self) -> usize {
		self.tokens.len()
	}

	pub fn n_documents(&self) -> u64 {
		self.n_documents
	}

	pub fn tokens(&self) -> &[TfidfToken] {
		&self.tokens
	}

	pub fn token_index(&self, token: &str) -> Option<usize> {
		self.tokens_map.get(token).copied()
	}

	/// Fit the first chunk with `fit_first` and every later chunk with `fit_update`.
	pub fn partial_fit<'a, I>(&mut self, documents: I) -> Result<(), Error>
	where
		I: IntoIterator<Item = &'a str>,
	{
		if self.fitted {
			self.fit_update(documents)
		} else {
			self.fit_first(documents)
		}
	}

	/// Build the vocabulary and idf values from scratch, discarding any previous state.
	pub fn fit_first<'a, I>(&mut self, documents: I) -> Result<(), Error>
	where
		I: IntoIterator<Item = &'a str>,
	{
		// token -> (occurrences, documents containing the token)
		let mut histogram: FnvHashMap<String, (u64, u64)> = FnvHashMap::default();
		let mut n_documents = 0;
		for document in documents {
			n_documents += 1;
			let mut token_set = FnvHashSet::default();
			for token in WordTokenizer::new(document, self.settings.lowercase) {
				let entry = histogram.entry(token.to_string()).or_insert((0, 0));
				entry.0 += 1;
				if token_set.insert(token) {
					entry.1 += 1;
				}
			}
		}
		if histogram.is_empty() {
			return Err(Error::EmptyVocabulary);
		}
		let mut entries: Vec<(String, u64, u64)> = histogram
			.into_iter()
			.map(|(token, (count, examples_count))| (token, count, examples_count))
			.collect();
		if let Some(max_features) = self.settings.max_features {
			if entries.len() > max_features {
				entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
				entries.truncate(max_features);
			}
		}
		entries.sort_by(|a, b| a.0.cmp(&b.0));
		self.tokens = entries
			.into_iter()
			.map(|(token, _, examples_count)| TfidfToken {
				token,
				idf: smoothed_idf(n_documents, examples_count),
			})
			.collect();
		self.tokens_map = index_tokens(&self.tokens);
		self.n_documents = n_documents;
		self.fitted = true;
		tracing::debug!(
			n_documents,
			vocabulary_len = self.tokens.len(),
			"fitted vectorizer"
		);
		Ok(())
	}

	/// Extend the vocabulary with the unseen tokens in `documents` and recompute every idf over all documents seen so far.
	pub fn fit_update<'a, I>(&mut self, documents: I) -> Result<(), Error>
	where
		I: IntoIterator<Item = &'a str>,
	{
		if !self.fitted {
			return Err(Error::NotFitted);
		}
		let mut document_frequencies: Vec<u64> = self
			.tokens
			.iter()
			.map(|entry| document_frequency_from_idf(self.n_documents, entry.idf))
			.collect();
		let n_tokens_before = self.tokens.len();
		let mut n_new_documents = 0;
		for document in documents {
			n_new_documents += 1;
			let mut token_set = FnvHashSet::default();
			for token in WordTokenizer::new(document, self.settings.lowercase) {
				let token_index = match self.tokens_map.get(&*token) {
					Some(token_index) => *token_index,
					None => {
						let token_index = self.tokens.len();
						self.tokens.push(TfidfToken {
							token: token.to_string(),
							idf: 0.0,
						});
						self.tokens_map.insert(token.to_string(), token_index);
						document_frequencies.push(0);
						token_index
					}
				};
				if token_set.insert(token_index) {
					document_frequencies[token_index] += 1;
				}
			}
		}
		self.n_documents += n_new_documents;
		for (entry, document_frequency) in self.tokens.iter_mut().zip(document_frequencies) {
			entry.idf = smoothed_idf(self.n_documents, document_frequency);
		}
		tracing::debug!(
			n_new_documents,
			n_new_tokens = self.tokens.len() - n_tokens_before,
			vocabulary_len = self.tokens.len(),
			"updated vectorizer"
		);
		Ok(())
	}

	/// Compute one sparse row per document with `vocabulary_len()` columns. Each entry is the token's count in the document times its idf. Tokens outside the vocabulary are ignored.
	pub fn transform<'a, I>(&self, documents: I) -> CsrMatrix
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut matrix = CsrMatrix::new(self.tokens.len());
		for document in documents {
			let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
			for token in WordTokenizer::new(document, self.settings.lowercase) {
				if let Some(token_index) = self.tokens_map.get(&*token) {
					*counts.entry(*token_index).or_insert(0.0) += 1.0;
				}
			}
			let mut values: Vec<(usize, f64)> = counts
				.into_iter()
				.map(|(token_index, count)| (token_index, count * self.tokens[token_index].idf))
				.collect();
			if self.settings.normalize {
				let norm = values
					.iter()
					.map(|(_, value)| value * value)
					.sum::<f64>()
					.sqrt();
				if norm > 0.0 {
					for (_, value) in values.iter_mut() {
						*value /= norm;
					}
				}
			}
			matrix.push_row(
				values
					.into_iter()
					.map(|(token_index, value)| (token_index, value as f32)),
			);
		}
		matrix
	}
}

#[cfg(test)]
const BOOK_TITLES: &[&str] = &["The Little Prince", "Stuart Little", "The Cat in the Hat"];

#[cfg(test)]
fn idf_of(vectorizer: &TfidfVectorizer, token: &str) -> f64 {
	vectorizer.tokens()[vectorizer.token_index(token).unwrap()].idf
}

#[test]
fn test_fit_first() {
	let mut vectorizer = TfidfVectorizer::new(TfidfSettings::default());
	vectorizer.fit_first(BOOK_TITLES.iter().copied()).unwrap();
	let tokens: Vec<&str> = vectorizer.tokens().iter().map(|t| t.token.as_str()).collect();
	assert_eq!(
		tokens,
		vec!["cat", "hat", "in", "little", "prince", "stuart", "the"]
	);
	assert_eq!(vectorizer.n_documents(), 3);
	assert!((idf_of(&vectorizer, "cat") - ((4.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
	assert!((idf_of(&vectorizer, "the") - ((4.0f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
}

#[test]
fn test_fit_update_is_monotonic() {
	let mut vectorizer = TfidfVectorizer::new(TfidfSettings::default());
	vectorizer.partial_fit(BOOK_TITLES.iter().copied()).unwrap();
	let before: Vec<String> = vectorizer.tokens().iter().map(|t| t.token.clone()).collect();
	let chunks: &[&[&str]] = &[
		&["A Little Life", "Zebra crossing"],
		&[],
		&["the the the"],
		&["Cat's Cradle", "aardvark"],
	];
	let mut previous_len = vectorizer.vocabulary_len();
	for chunk in chunks {
		vectorizer.partial_fit(chunk.iter().copied()).unwrap();
		assert!(vectorizer.vocabulary_len() >= previous_len);
		previous_len = vectorizer.vocabulary_len();
		for (index, token) in before.iter().enumerate() {
			assert_eq!(vectorizer.token_index(token), Some(index));
		}
	}
	// New tokens are appended, never sorted into place.
	assert_eq!(vectorizer.token_index("life"), Some(7));
	assert_eq!(vectorizer.token_index("aardvark"), Some(vectorizer.vocabulary_len() - 1));
	assert_eq!(vectorizer.n_documents(), 8);
}

#[test]
fn test_incremental_fit_matches_batch_fit() {
	let first = ["deep learning for graphs", "a survey of graph networks"];
	let second = ["graph transformers", "reinforcement learning survey", ""];
	let third = ["learning to learn", "deep deep deep"];
	let mut incremental = TfidfVectorizer::new(TfidfSettings::default());
	incremental.partial_fit(first.iter().copied()).unwrap();
	incremental.partial_fit(second.iter().copied()).unwrap();
	incremental.partial_fit(third.iter().copied()).unwrap();
	let mut batch = TfidfVectorizer::new(TfidfSettings::default());
	batch
		.fit_first(first.iter().chain(second.iter()).chain(third.iter()).copied())
		.unwrap();
	assert_eq!(incremental.n_documents(), batch.n_documents());
	assert_eq!(incremental.vocabulary_len(), batch.vocabulary_len());
	for entry in batch.tokens() {
		let difference = (idf_of(&incremental, &entry.token) - entry.idf).abs();
		assert!(difference < 1e-9, "{}", entry.token);
	}
}

#[test]
fn test_document_frequency_round_trip() {
	for n_documents in [1u64, 10, 1000, 250_000].iter() {
		for document_frequency in [0u64, 1, *n_documents / 2, *n_documents].iter() {
			let idf = smoothed_idf(*n_documents, *document_frequency);
			assert_eq!(
				document_frequency_from_idf(*n_documents, idf),
				*document_frequency
			);
		}
	}
}

#[test]
fn test_transform() {
	let mut vectorizer = TfidfVectorizer::new(TfidfSettings {
		normalize: false,
		..Default::default()
	});
	vectorizer.fit_first(BOOK_TITLES.iter().copied()).unwrap();
	let matrix = vectorizer.transform(vec!["the THE cat", "unseen words only", ""]);
	assert_eq!(matrix.nrows(), 3);
	assert_eq!(matrix.ncols(), 7);
	let (indices, values) = matrix.row(0);
	assert_eq!(indices, &[0, 6]);
	assert!((values[0] as f64 - idf_of(&vectorizer, "cat")).abs() < 1e-6);
	assert!((values[1] as f64 - 2.0 * idf_of(&vectorizer, "the")).abs() < 1e-6);
	assert_eq!(matrix.row(1).0.len(), 0);
	assert_eq!(matrix.row(2).0.len(), 0);
}

#[test]
fn test_transform_normalizes_rows() {
	let mut vectorizer = TfidfVectorizer::new(TfidfSettings::default());
	vectorizer.fit_first(BOOK_TITLES.iter().copied()).unwrap();
	let matrix = vectorizer.transform(BOOK_TITLES.iter().copied());
	for row in 0..matrix.nrows() {
		let norm: f32 = matrix.row(row).1.iter().map(|v| v * v).sum();
		assert!((norm - 1.0).abs() < 1e-5);
	}
}

#[test]
fn test_max_features_keeps_most_frequent_tokens() {
	let mut vectorizer = TfidfVectorizer::new(TfidfSettings {
		max_features: Some(2),
		..Default::default()
	});
	vectorizer
		.fit_first(vec!["zeta zeta zeta beta", "alpha beta", "gamma"])
		.unwrap();
	let tokens: Vec<&str> = vectorizer.tokens().iter().map(|t| t.token.as_str()).collect();
	assert_eq!(tokens, vec!["beta", "zeta"]);
}

#[test]
fn test_fit_errors() {
	let mut vectorizer = TfidfVectorizer::new(TfidfSettings::default());
	assert!(matches!(
		vectorizer.fit_update(vec!["hello world"]),
		Err(Error::NotFitted)
	));
	assert!(matches!(
		vectorizer.fit_first(vec!["a", "!"]),
		Err(Error::EmptyVocabulary)
	));
	assert!(!vectorizer.is_fitted());
}

#[test]
fn test_deserialize_rebuilds_token_index() {
	let mut vectorizer = TfidfVectorizer::new(TfidfSettings::default());
	vectorizer.fit_first(BOOK_TITLES.iter().copied()).unwrap();
	vectorizer.fit_update(vec!["Zebra"]).unwrap();
	let bytes = rmp_serde::to_vec_named(&vectorizer).unwrap();
	let restored: TfidfVectorizer = rmp_serde::from_slice(&bytes).unwrap();
	assert_eq!(restored, vectorizer);
	assert_eq!(restored.token_index("zebra"), Some(7));
	assert_eq!(
		restored.transform(BOOK_TITLES.iter().copied()),
		vectorizer.transform(BOOK_TITLES.iter().copied())
	);
}
