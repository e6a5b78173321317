/*!
This crate implements a chunked machine learning pipeline that predicts whether a post will be popular. It has three stages, each of which streams its input one chunk at a time:

1. [`preprocess`](fn.preprocess.html) transforms the raw table and splits it into train and test tables.
2. [`train`](fn.train.html) fits a text vectorizer and a linear classifier incrementally and writes them as artifacts.
3. [`evaluate`](fn.evaluate.html) scores the test table with the persisted artifacts and writes a metrics report.

Every stage takes a [`Config`](config/struct.Config.html), read once when the process starts, and the [`DataPaths`](storage/struct.DataPaths.html) resolved from it.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod error;

pub mod config;
pub mod evaluate;
pub mod features;
pub mod model;
pub mod preprocess;
pub mod report;
pub mod schema;
pub mod split;
pub mod storage;
pub mod train;
pub mod transform;

pub use self::{
	config::Config,
	error::{Error, Result},
	evaluate::{evaluate, EvaluateSummary},
	preprocess::{preprocess, PreprocessSummary},
	storage::{DataPaths, LocalStorageRoot, StorageRootProvider},
	train::{train, TrainSummary},
};
