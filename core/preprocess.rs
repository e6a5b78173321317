use crate::{
	config::Config,
	schema::{processed_column_names, raw_csv_options},
	split::SplitWriter,
	storage::DataPaths,
	transform::transform_chunk,
	Error, Result,
};
use upvote_dataframe::CsvSource;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreprocessSummary {
	pub n_chunks: usize,
	pub n_rows_read: usize,
	pub n_rows_kept: usize,
	pub n_train_rows: usize,
	pub n_test_rows: usize,
}

/**
Read the raw table chunk by chunk, transform each chunk and append its stratified train and test parts to the train and test tables. Chunks are processed one at a time, so memory use depends on the chunk size and not on the size of the table.
*/
pub fn preprocess(config: &Config, paths: &DataPaths) -> Result<PreprocessSummary> {
	let pre_process = &config.pre_process;
	check_target_column(&pre_process.target_col)?;
	let source = CsvSource::new(paths.raw.clone(), pre_process.chunk_size, raw_csv_options());
	let mut writer = SplitWriter::new(
		&paths.train,
		&paths.test,
		&pre_process.target_col,
		pre_process.test_fraction,
		pre_process.random_seed,
	);
	let mut summary = PreprocessSummary::default();
	for (chunk_index, chunk) in source.chunks()?.enumerate() {
		let chunk = chunk?;
		let n_rows = chunk.nrows();
		let processed = transform_chunk(chunk)?;
		let split = writer.write_chunk(&processed)?;
		tracing::info!(
			chunk_index,
			n_rows,
			n_rows_kept = processed.nrows(),
			n_train_rows = split.n_train_rows,
			n_test_rows = split.n_test_rows,
			"preprocessed chunk"
		);
		summary.n_chunks += 1;
		summary.n_rows_read += n_rows;
		summary.n_rows_kept += processed.nrows();
		summary.n_train_rows += split.n_train_rows;
		summary.n_test_rows += split.n_test_rows;
	}
	writer.finish()?;
	if summary.n_chunks == 0 {
		tracing::warn!(
			path = %paths.raw.display(),
			"the raw table has no rows, the train and test tables are empty"
		);
	}
	Ok(summary)
}

/// The target must be one of the processed number columns.
pub(crate) fn check_target_column(target_column: &str) -> Result<()> {
	if processed_column_names()
		.iter()
		.any(|name| name == target_column)
	{
		Ok(())
	} else {
		Err(Error::Config(format!(
			"pre_process.target_col \"{}\" is not a column of the processed table",
			target_column
		)))
	}
}
