use std::path::PathBuf;
use upvote_metrics::MetricUndefinedError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a pipeline stage can fail. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid configuration: {0}")]
	Config(String),
	#[error("i/o error at \"{}\"", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: Box<dyn std::error::Error + Send + Sync>,
	},
	#[error("schema error: {0}")]
	Schema(String),
	#[error(transparent)]
	MetricUndefined(#[from] MetricUndefinedError),
	#[error("invalid artifact \"{}\": {message}", .path.display())]
	Artifact { path: PathBuf, message: String },
	#[error(transparent)]
	Model(#[from] upvote_linear::Error),
	#[error(transparent)]
	Features(upvote_features::Error),
}

impl Error {
	pub(crate) fn io(
		path: impl Into<PathBuf>,
		source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
	) -> Error {
		Error::Io {
			path: path.into(),
			source: source.into(),
		}
	}
}

impl From<upvote_dataframe::Error> for Error {
	fn from(error: upvote_dataframe::Error) -> Self {
		use upvote_dataframe::Error as DataFrameError;
		match error {
			DataFrameError::ColumnNotFound(_) | DataFrameError::ColumnType { .. } => {
				Error::Schema(error.to_string())
			}
			DataFrameError::InvalidChunkSize => Error::Config(error.to_string()),
			_ => {
				let path = error.path().map(|path| path.to_owned()).unwrap_or_default();
				Error::io(path, error)
			}
		}
	}
}

impl From<upvote_features::Error> for Error {
	fn from(error: upvote_features::Error) -> Self {
		match error {
			upvote_features::Error::Column(error) => error.into(),
			error => Error::Features(error),
		}
	}
}

#[test]
fn test_dataframe_errors_map_to_taxonomy() {
	let error: Error = upvote_dataframe::Error::ColumnNotFound("is_top_decile".to_owned()).into();
	assert!(matches!(error, Error::Schema(_)));
	let error: Error = upvote_dataframe::Error::Open {
		path: "missing.csv".into(),
		source: std::io::Error::from(std::io::ErrorKind::NotFound),
	}
	.into();
	match error {
		Error::Io { path, .. } => assert_eq!(path, PathBuf::from("missing.csv")),
		error => panic!("unexpected error {:?}", error),
	}
	let error: Error = upvote_features::Error::Column(upvote_dataframe::Error::ColumnNotFound(
		"title_len".to_owned(),
	))
	.into();
	assert!(matches!(error, Error::Schema(_)));
}
