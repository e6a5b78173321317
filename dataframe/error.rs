use crate::ColumnType;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("failed to open \"{}\"", path.display())]
	Open {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to read \"{}\"", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: csv::Error,
	},
	#[error("failed to write \"{}\"", path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: csv::Error,
	},
	#[error("\"{}\" row {row}: invalid number {value:?} in column \"{column}\"", path.display())]
	InvalidNumber {
		path: PathBuf,
		row: u64,
		column: String,
		value: String,
	},
	#[error("chunk size must be positive")]
	InvalidChunkSize,
	#[error("column \"{0}\" not found")]
	ColumnNotFound(String),
	#[error("column \"{name}\" is not a {expected} column")]
	ColumnType { name: String, expected: ColumnType },
}

impl Error {
	/// The file this error refers to, if any.
	pub fn path(&self) -> Option<&Path> {
		match self {
			Error::Open { path, .. }
			| Error::Read { path, .. }
			| Error::Write { path, .. }
			| Error::InvalidNumber { path, .. } => Some(path),
			_ => None,
		}
	}
}
