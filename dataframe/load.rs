use super::*;
use std::{
	collections::BTreeMap,
	fs::File,
	io::Read,
	path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct FromCsvOptions {
	/// The type of each named column. Columns not listed here get `default_column_type`.
	pub column_types: BTreeMap<String, ColumnType>,
	pub default_column_type: ColumnType,
	/// Values in number columns that are read as missing (`NaN`) rather than rejected.
	pub invalid_values: Vec<String>,
}

impl Default for FromCsvOptions {
	fn default() -> Self {
		Self {
			column_types: BTreeMap::new(),
			default_column_type: ColumnType::Text,
			invalid_values: DEFAULT_INVALID_VALUES
				.iter()
				.map(|value| (*value).to_owned())
				.collect(),
		}
	}
}

/// These values are the default values that are considered invalid.
pub const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

/**
A `CsvSource` names a delimited file and how to chunk it. Each call to [`chunks`](#method.chunks) opens the file again and starts an independent pass from the first row, so a source can be read as many times as needed.
*/
#[derive(Clone, Debug)]
pub struct CsvSource {
	pub path: PathBuf,
	pub chunk_size: usize,
	pub options: FromCsvOptions,
}

impl CsvSource {
	pub fn new(path: PathBuf, chunk_size: usize, options: FromCsvOptions) -> Self {
		Self {
			path,
			chunk_size,
			options,
		}
	}

	pub fn chunks(&self) -> Result<CsvChunks<File>> {
		CsvChunks::from_path(&self.path, self.chunk_size, &self.options)
	}
}

/**
`CsvChunks` is a lazy iterator over a delimited file that yields dataframes of exactly `chunk_size` rows, except for the last one, which may be shorter. Rows are yielded in file order. The first error ends the iteration.
*/
pub struct CsvChunks<R> {
	path: PathBuf,
	reader: csv::Reader<R>,
	column_names: Vec<String>,
	column_types: Vec<ColumnType>,
	invalid_values: Vec<String>,
	chunk_size: usize,
	n_rows_read: u64,
	record: csv::StringRecord,
	finished: bool,
}

impl CsvChunks<File> {
	pub fn from_path(path: &Path, chunk_size: usize, options: &FromCsvOptions) -> Result<Self> {
		let file = File::open(path).map_err(|source| Error::Open {
			path: path.to_owned(),
			source,
		})?;
		Self::from_reader(path, file, chunk_size, options)
	}
}

impl<R> CsvChunks<R>
where
	R: Read,
{
	/// Create chunks from any reader. `path` is only used to give errors context.
	pub fn from_reader(
		path: &Path,
		reader: R,
		chunk_size: usize,
		options: &FromCsvOptions,
	) -> Result<Self> {
		if chunk_size == 0 {
			return Err(Error::InvalidChunkSize);
		}
		let mut reader = csv::Reader::from_reader(reader);
		let column_names: Vec<String> = reader
			.headers()
			.map_err(|source| Error::Read {
				path: path.to_owned(),
				source,
			})?
			.iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let column_types = column_names
			.iter()
			.map(|column_name| {
				options
					.column_types
					.get(column_name)
					.copied()
					.unwrap_or(options.default_column_type)
			})
			.collect();
		Ok(Self {
			path: path.to_owned(),
			reader,
			column_names,
			column_types,
			invalid_values: options.invalid_values.clone(),
			chunk_size,
			n_rows_read: 0,
			record: csv::StringRecord::new(),
			finished: false,
		})
	}

	pub fn column_names(&self) -> &[String] {
		&self.column_names
	}

	fn read_chunk(&mut self) -> Result<Option<DataFrame>> {
		let mut dataframe = DataFrame::empty(&self.column_names, &self.column_types);
		while dataframe.nrows() < self.chunk_size {
			let has_record =
				self.reader
					.read_record(&mut self.record)
					.map_err(|source| Error::Read {
						path: self.path.clone(),
						source,
					})?;
			if !has_record {
				self.finished = true;
				break;
			}
			let row = self.n_rows_read;
			for (column, value) in izip!(dataframe.columns.iter_mut(), self.record.iter()) {
				match column {
					Column::Number(column) => {
						let value = if self.invalid_values.iter().any(|invalid| invalid == value) {
							std::f32::NAN
						} else {
							match lexical::parse::<f32, &str>(value) {
								Ok(value) => value,
								Err(_) => {
									return Err(Error::InvalidNumber {
										path: self.path.clone(),
										row,
										column: column.name.clone(),
										value: value.to_owned(),
									})
								}
							}
						};
						column.data.push(value);
					}
					Column::Text(column) => {
						let value = if value.is_empty() {
							None
						} else {
							Some(value.to_owned())
						};
						column.data.push(value);
					}
				}
			}
			dataframe.index.push(row);
			self.n_rows_read += 1;
		}
		debug!(
			path = %self.path.display(),
			n_rows = dataframe.nrows(),
			n_rows_read = self.n_rows_read,
			"read chunk"
		);
		if dataframe.nrows() == 0 {
			Ok(None)
		} else {
			Ok(Some(dataframe))
		}
	}
}

impl<R> Iterator for CsvChunks<R>
where
	R: Read,
{
	type Item = Result<DataFrame>;
	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}
		match self.read_chunk() {
			Ok(Some(dataframe)) => Some(Ok(dataframe)),
			Ok(None) => None,
			Err(error) => {
				self.finished = true;
				Some(Err(error))
			}
		}
	}
}

#[cfg(test)]
fn chunks_from_str(csv: &str, chunk_size: usize) -> CsvChunks<std::io::Cursor<String>> {
	let mut options = FromCsvOptions::default();
	options
		.column_types
		.insert("score".to_owned(), ColumnType::Number);
	CsvChunks::from_reader(
		Path::new("test.csv"),
		std::io::Cursor::new(csv.to_owned()),
		chunk_size,
		&options,
	)
	.unwrap()
}

#[test]
fn test_chunk_sizes_and_order() {
	let csv = "title,score\na,1\nb,2\nc,\nd,4\ne,5\n";
	let chunks: Vec<DataFrame> = chunks_from_str(csv, 2).map(|c| c.unwrap()).collect();
	let sizes: Vec<usize> = chunks.iter().map(|c| c.nrows()).collect();
	assert_eq!(sizes, vec![2, 2, 1]);
	let index: Vec<u64> = chunks.iter().flat_map(|c| c.index.clone()).collect();
	assert_eq!(index, vec![0, 1, 2, 3, 4]);
	let score = chunks[1].number_column("score").unwrap();
	assert!(score.data[0].is_nan());
	assert_eq!(score.data[1], 4.0);
	assert_eq!(
		chunks[2].text_column("title").unwrap().data,
		vec![Some("e".to_owned())]
	);
}

#[test]
fn test_empty_fields_are_missing_text() {
	let csv = "title,body\na,\n";
	let chunk = chunks_from_str(csv, 10).next().unwrap().unwrap();
	assert_eq!(chunk.text_column("body").unwrap().data, vec![None]);
}

#[test]
fn test_header_only_file_has_no_chunks() {
	assert!(chunks_from_str("title,score\n", 3).next().is_none());
}

#[test]
fn test_malformed_rows_fail_fast() {
	let csv = "title,score\na,1\nb,2,extra\nc,3\n";
	let mut chunks = chunks_from_str(csv, 1);
	assert!(chunks.next().unwrap().is_ok());
	assert!(matches!(chunks.next(), Some(Err(Error::Read { .. }))));
	assert!(chunks.next().is_none());
}

#[test]
fn test_invalid_number() {
	let csv = "title,score\na,lots\n";
	let error = chunks_from_str(csv, 1).next().unwrap().unwrap_err();
	assert!(matches!(error, Error::InvalidNumber { row: 0, .. }));
}

#[test]
fn test_zero_chunk_size_is_rejected() {
	let result = CsvChunks::from_reader(
		Path::new("test.csv"),
		std::io::Cursor::new("a\n1\n"),
		0,
		&FromCsvOptions::default(),
	);
	assert!(matches!(result, Err(Error::InvalidChunkSize)));
}

#[test]
fn test_missing_file() {
	let source = CsvSource::new(
		PathBuf::from("/definitely/not/here.csv"),
		10,
		FromCsvOptions::default(),
	);
	assert!(matches!(source.chunks(), Err(Error::Open { .. })));
}

#[test]
fn test_source_supports_independent_passes() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("table.csv");
	std::fs::write(&path, "title\na\nb\nc\n").unwrap();
	let source = CsvSource::new(path, 2, FromCsvOptions::default());
	let first: Vec<DataFrame> = source.chunks().unwrap().map(|c| c.unwrap()).collect();
	let second: Vec<DataFrame> = source.chunks().unwrap().map(|c| c.unwrap()).collect();
	assert_eq!(first.len(), 2);
	assert_eq!(first, second);
}
