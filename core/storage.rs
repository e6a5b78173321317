use crate::{config::PathsConfig, Error, Result};
use std::path::{Path, PathBuf};

/// A `StorageRootProvider` finds the directory that every data and model path is relative to.
pub trait StorageRootProvider {
	fn resolve_storage_root(&self) -> Result<PathBuf>;
}

/// Resolves a directory on the local filesystem, which must exist.
#[derive(Clone, Debug)]
pub struct LocalStorageRoot {
	root: PathBuf,
}

impl LocalStorageRoot {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn from_config(paths: &PathsConfig) -> Self {
		Self::new(
			paths
				.storage_root
				.clone()
				.unwrap_or_else(|| PathBuf::from(".")),
		)
	}
}

impl StorageRootProvider for LocalStorageRoot {
	fn resolve_storage_root(&self) -> Result<PathBuf> {
		if self.root.is_dir() {
			Ok(self.root.clone())
		} else {
			Err(Error::io(
				self.root.clone(),
				"the storage root is not a directory",
			))
		}
	}
}

/// The location of every file the pipeline reads or writes.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPaths {
	pub raw: PathBuf,
	pub train: PathBuf,
	pub test: PathBuf,
	pub models_dir: PathBuf,
	pub model: PathBuf,
	pub tfidf: PathBuf,
	pub train_metrics: PathBuf,
	pub test_metrics: PathBuf,
	pub result: PathBuf,
}

impl DataPaths {
	pub fn resolve(provider: &dyn StorageRootProvider, paths: &PathsConfig) -> Result<DataPaths> {
		let root = provider.resolve_storage_root()?;
		let join = |path: &Option<PathBuf>, default: &str| -> PathBuf {
			root.join(path.as_deref().unwrap_or_else(|| Path::new(default)))
		};
		let models_dir = join(&paths.models_dir, "models");
		Ok(DataPaths {
			raw: join(&paths.raw, "data/raw/rML-raw-data.csv"),
			train: join(&paths.train, "data/processed/rML-train.csv"),
			test: join(&paths.test, "data/processed/rML-test.csv"),
			model: models_dir.join("model.bin"),
			tfidf: models_dir.join("tfidf.bin"),
			train_metrics: models_dir.join("metrics").join("train.yaml"),
			test_metrics: models_dir.join("metrics").join("test.yaml"),
			result: models_dir.join("result.yaml"),
			models_dir,
		})
	}
}

/// Create the parent directory of `path` if it does not exist.
pub(crate) fn create_parent_dir(path: &Path) -> Result<()> {
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			std::fs::create_dir_all(parent).map_err(|error| Error::io(parent, error))?;
		}
	}
	Ok(())
}

#[test]
fn test_resolve_defaults() {
	let dir = tempfile::tempdir().unwrap();
	let provider = LocalStorageRoot::new(dir.path());
	let paths = DataPaths::resolve(&provider, &PathsConfig::default()).unwrap();
	assert_eq!(paths.raw, dir.path().join("data/raw/rML-raw-data.csv"));
	assert_eq!(paths.model, dir.path().join("models").join("model.bin"));
	assert_eq!(
		paths.test_metrics,
		dir.path().join("models").join("metrics").join("test.yaml")
	);
}

#[test]
fn test_resolve_configured_paths() {
	let dir = tempfile::tempdir().unwrap();
	let paths = PathsConfig {
		storage_root: Some(dir.path().to_owned()),
		train: Some("train.csv".into()),
		models_dir: Some("/tmp/elsewhere".into()),
		..Default::default()
	};
	let provider = LocalStorageRoot::from_config(&paths);
	let resolved = DataPaths::resolve(&provider, &paths).unwrap();
	assert_eq!(resolved.train, dir.path().join("train.csv"));
	assert_eq!(resolved.result, PathBuf::from("/tmp/elsewhere/result.yaml"));
}

#[test]
fn test_missing_storage_root() {
	let provider = LocalStorageRoot::new("/definitely/not/a/storage/root");
	assert!(matches!(
		DataPaths::resolve(&provider, &PathsConfig::default()),
		Err(Error::Io { .. })
	));
}
