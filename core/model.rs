use crate::{config::FeatureSource, storage::create_parent_dir, Error, Result};
use std::{
	io::{Read, Write},
	path::Path,
};
use upvote_features::TfidfVectorizer;
use upvote_linear::BinaryClassifier;

const MAJOR_VERSION: u8 = 0;

/// The trained classifier together with what it needs to be applied to new chunks.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelArtifact {
	pub feature_source: FeatureSource,
	pub target_column_name: String,
	pub feature_names: Vec<String>,
	pub classifier: BinaryClassifier,
}

/**
An `Artifact` is a value persisted between pipeline stages. The file format is a one byte major version followed by the value as MessagePack with named fields.
*/
pub trait Artifact: serde::Serialize + serde::de::DeserializeOwned {
	/// Serialize this artifact to bytes.
	fn to_bytes(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
		let mut bytes = vec![MAJOR_VERSION];
		rmp_serde::encode::write_named(&mut bytes, self)?;
		Ok(bytes)
	}

	/// Deserialize an artifact from a slice.
	fn from_slice(slice: &[u8]) -> Result<Self, String> {
		let (major_version, slice) = slice
			.split_first()
			.ok_or_else(|| "the artifact is empty".to_owned())?;
		if *major_version != MAJOR_VERSION {
			return Err(format!("unknown major version {}", major_version));
		}
		rmp_serde::from_slice(slice).map_err(|error| error.to_string())
	}

	/// Deserialize an artifact by reading the file at `path`.
	fn from_path(path: &Path) -> Result<Self> {
		let file = std::fs::File::open(path).map_err(|error| Error::io(path, error))?;
		let mut reader = std::io::BufReader::new(file);
		let mut bytes = Vec::new();
		reader
			.read_to_end(&mut bytes)
			.map_err(|error| Error::io(path, error))?;
		Self::from_slice(&bytes).map_err(|message| Error::Artifact {
			path: path.to_owned(),
			message,
		})
	}

	/// Write this artifact to the file at `path`, creating its directory if needed.
	fn to_path(&self, path: &Path) -> Result<()> {
		let bytes = self.to_bytes().map_err(|error| Error::Artifact {
			path: path.to_owned(),
			message: error.to_string(),
		})?;
		create_parent_dir(path)?;
		let file = std::fs::File::create(path).map_err(|error| Error::io(path, error))?;
		let mut writer = std::io::BufWriter::new(file);
		writer
			.write_all(&bytes)
			.and_then(|_| writer.flush())
			.map_err(|error| Error::io(path, error))?;
		Ok(())
	}
}

impl Artifact for ModelArtifact {}

impl Artifact for TfidfVectorizer {}

#[cfg(test)]
fn test_model() -> ModelArtifact {
	use upvote_features::FeatureMatrix;
	use upvote_linear::{Loss, TrainOptions, CLASSES};
	let features = FeatureMatrix::Dense(ndarray::arr2(&[[1.0, 0.5], [-1.0, 0.25]]));
	let mut classifier = BinaryClassifier::new(2, Loss::Log, TrainOptions::default());
	classifier.partial_fit(&features, &[1, 0], &CLASSES).unwrap();
	ModelArtifact {
		feature_source: FeatureSource::NumberCategory,
		target_column_name: "is_top_decile".to_owned(),
		feature_names: vec!["title_len".to_owned(), "body_len".to_owned()],
		classifier,
	}
}

#[test]
fn test_model_artifact_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("models").join("model.bin");
	let model = test_model();
	model.to_path(&path).unwrap();
	let restored = ModelArtifact::from_path(&path).unwrap();
	assert_eq!(restored, model);
	assert_eq!(restored.to_bytes().unwrap(), std::fs::read(&path).unwrap());
}

#[test]
fn test_vectorizer_artifact_round_trip() {
	let mut vectorizer = TfidfVectorizer::new(Default::default());
	vectorizer
		.partial_fit(vec!["machine learning", "deep learning"])
		.unwrap();
	vectorizer.partial_fit(vec!["learning rust"]).unwrap();
	let bytes = vectorizer.to_bytes().unwrap();
	let restored = TfidfVectorizer::from_slice(&bytes).unwrap();
	assert_eq!(restored, vectorizer);
	assert_eq!(restored.to_bytes().unwrap(), bytes);
	let documents = vec!["rust learning", "unseen"];
	assert_eq!(
		restored.transform(documents.clone()),
		vectorizer.transform(documents)
	);
}

#[test]
fn test_invalid_artifacts() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("model.bin");
	let mut bytes = test_model().to_bytes().unwrap();
	bytes[0] = 1;
	std::fs::write(&path, &bytes).unwrap();
	assert!(matches!(
		ModelArtifact::from_path(&path),
		Err(Error::Artifact { .. })
	));
	std::fs::write(&path, b"").unwrap();
	assert!(matches!(
		ModelArtifact::from_path(&path),
		Err(Error::Artifact { .. })
	));
	assert!(matches!(
		ModelArtifact::from_path(&dir.path().join("missing.bin")),
		Err(Error::Io { .. })
	));
}
