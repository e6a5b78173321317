use crate::{
	schema::{processed_column_names, processed_csv_options},
	storage::create_parent_dir,
	Error, Result,
};
use num_traits::ToPrimitive;
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::{
	collections::BTreeMap,
	path::{Path, PathBuf},
};
use upvote_dataframe::{DataFrame, ToCsvOptions, WriteMode};

const FIRST_CHUNK_OPTIONS: ToCsvOptions = ToCsvOptions {
	mode: WriteMode::Truncate,
	header: true,
	index: true,
};

/// Row positions of one chunk, each list in ascending order.
#[derive(Debug, PartialEq)]
pub struct StratifiedSplit {
	pub train: Vec<usize>,
	pub test: Vec<usize>,
}

/**
Split row positions into train and test so that both keep the class proportions of `labels`. The test set gets `ceil(test_fraction * n)` rows, shared among the classes in proportion to their sizes, with leftover rows going to the classes with the largest remainders. The rows of each class are chosen by a shuffle seeded with `seed`, so the same labels always produce the same split.
*/
pub fn stratified_split(labels: &[usize], test_fraction: f32, seed: u64) -> StratifiedSplit {
	let n_rows = labels.len();
	let mut classes: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
	for (position, label) in labels.iter().enumerate() {
		classes.entry(*label).or_insert_with(Vec::new).push(position);
	}
	let n_rows_f64 = n_rows.to_f64().unwrap_or(0.0);
	let n_test = (f64::from(test_fraction) * n_rows_f64)
		.ceil()
		.to_usize()
		.unwrap_or(0)
		.min(n_rows);

	// Allocate the test rows to classes by largest remainder.
	let mut allocations: Vec<(usize, f64)> = classes
		.values()
		.map(|positions| {
			let quota = if n_rows == 0 {
				0.0
			} else {
				let n_class = positions.len().to_f64().unwrap_or(0.0);
				n_test.to_f64().unwrap_or(0.0) * n_class / n_rows_f64
			};
			let floor = quota.floor();
			(floor.to_usize().unwrap_or(0), quota - floor)
		})
		.collect();
	let mut n_unallocated = n_test - allocations.iter().map(|(n, _)| n).sum::<usize>();
	let mut by_remainder: Vec<usize> = (0..allocations.len()).collect();
	by_remainder.sort_by(|a, b| {
		allocations[*b]
			.1
			.partial_cmp(&allocations[*a].1)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then(a.cmp(b))
	});
	for class_index in by_remainder {
		if n_unallocated == 0 {
			break;
		}
		allocations[class_index].0 += 1;
		n_unallocated -= 1;
	}

	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut train = Vec::with_capacity(n_rows - n_test);
	let mut test = Vec::with_capacity(n_test);
	for (mut positions, (n_class_test, _)) in classes.into_iter().map(|(_, p)| p).zip(allocations) {
		positions.shuffle(&mut rng);
		let n_class_test = n_class_test.min(positions.len());
		test.extend_from_slice(&positions[..n_class_test]);
		train.extend_from_slice(&positions[n_class_test..]);
	}
	train.sort_unstable();
	test.sort_unstable();
	StratifiedSplit { train, test }
}

/// How the rows of one chunk were divided.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SplitSummary {
	pub n_train_rows: usize,
	pub n_test_rows: usize,
}

/**
A `SplitWriter` splits each processed chunk and appends the two parts to the train and test tables. The first chunk replaces any previous contents and writes the header. Later chunks append rows only, and must have exactly the first chunk's columns. Rows written for earlier chunks stay written if a later chunk fails.
*/
pub struct SplitWriter {
	train_path: PathBuf,
	test_path: PathBuf,
	target_column: String,
	test_fraction: f32,
	seed: u64,
	header: Option<Vec<String>>,
}

impl SplitWriter {
	pub fn new(
		train_path: &Path,
		test_path: &Path,
		target_column: &str,
		test_fraction: f32,
		seed: u64,
	) -> Self {
		Self {
			train_path: train_path.to_owned(),
			test_path: test_path.to_owned(),
			target_column: target_column.to_owned(),
			test_fraction,
			seed,
			header: None,
		}
	}

	pub fn write_chunk(&mut self, chunk: &DataFrame) -> Result<SplitSummary> {
		let column_names: Vec<String> = chunk
			.column_names()
			.into_iter()
			.map(|name| name.to_owned())
			.collect();
		let is_first_chunk = match &self.header {
			None => true,
			Some(header) if *header == column_names => false,
			Some(header) => {
				return Err(Error::Schema(format!(
					"chunk columns {:?} differ from the columns already written {:?}",
					column_names, header
				)))
			}
		};
		let labels = crate::features::labels(chunk, &self.target_column)?;
		let split = stratified_split(&labels, self.test_fraction, self.seed);
		let options = if is_first_chunk {
			create_parent_dir(&self.train_path)?;
			create_parent_dir(&self.test_path)?;
			FIRST_CHUNK_OPTIONS
		} else {
			ToCsvOptions {
				mode: WriteMode::Append,
				header: false,
				index: true,
			}
		};
		chunk
			.select_rows(&split.train)
			.to_path(&self.train_path, options)?;
		chunk
			.select_rows(&split.test)
			.to_path(&self.test_path, options)?;
		if is_first_chunk {
			self.header = Some(column_names);
		}
		tracing::debug!(
			n_train_rows = split.train.len(),
			n_test_rows = split.test.len(),
			"split chunk"
		);
		Ok(SplitSummary {
			n_train_rows: split.train.len(),
			n_test_rows: split.test.len(),
		})
	}

	/// Finish the run. If no chunk was written, both tables are replaced with the processed header and no rows.
	pub fn finish(self) -> Result<()> {
		if self.header.is_some() {
			return Ok(());
		}
		let column_names = processed_column_names();
		let options = processed_csv_options();
		let column_types: Vec<_> = column_names
			.iter()
			.map(|name| {
				options
					.column_types
					.get(name)
					.copied()
					.unwrap_or(options.default_column_type)
			})
			.collect();
		let empty = DataFrame::empty(&column_names, &column_types);
		for path in [&self.train_path, &self.test_path].iter() {
			create_parent_dir(path)?;
			empty.to_path(path, FIRST_CHUNK_OPTIONS)?;
		}
		Ok(())
	}
}

#[test]
fn test_stratified_split_keeps_proportions() {
	let labels: Vec<usize> = (0..400).map(|i| if i % 4 == 0 { 1 } else { 0 }).collect();
	let split = stratified_split(&labels, 0.25, 42);
	assert_eq!(split.test.len(), 100);
	assert_eq!(split.train.len(), 300);
	let positives = |positions: &[usize]| positions.iter().filter(|p| labels[**p] == 1).count();
	assert_eq!(positives(&split.test), 25);
	assert_eq!(positives(&split.train), 75);
	let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
	all.sort_unstable();
	assert_eq!(all, (0..400).collect::<Vec<_>>());
}

#[test]
fn test_stratified_split_uneven_classes() {
	let labels = vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 1];
	let split = stratified_split(&labels, 0.25, 7);
	// ceil(2.5) = 3 test rows, quotas 2.1 and 0.9
	assert_eq!(split.test.len(), 3);
	let positives = split.test.iter().filter(|p| labels[**p] == 1).count();
	assert_eq!(positives, 1);
}

#[test]
fn test_stratified_split_is_deterministic() {
	let labels: Vec<usize> = (0..50).map(|i| (i * 7 % 3 == 0) as usize).collect();
	assert_eq!(
		stratified_split(&labels, 0.3, 42),
		stratified_split(&labels, 0.3, 42)
	);
	assert_ne!(
		stratified_split(&labels, 0.3, 42),
		stratified_split(&labels, 0.3, 43)
	);
}

#[test]
fn test_stratified_split_small_chunks() {
	let split = stratified_split(&[1], 0.25, 42);
	assert_eq!(split.test, vec![0]);
	assert!(split.train.is_empty());
	assert_eq!(
		stratified_split(&[], 0.25, 42),
		StratifiedSplit {
			train: vec![],
			test: vec![]
		}
	);
}

#[cfg(test)]
fn labelled_chunk(index: Vec<u64>, labels: Vec<f32>) -> DataFrame {
	use upvote_dataframe::{Column, NumberColumn, TextColumn};
	let titles = index.iter().map(|i| Some(format!("post {}", i))).collect();
	DataFrame::new(
		index,
		vec![
			Column::Text(TextColumn::new("title".to_owned(), titles)),
			Column::Number(NumberColumn::new("is_top_decile".to_owned(), labels)),
		],
	)
}

#[test]
fn test_split_writer_writes_header_once() {
	let dir = tempfile::tempdir().unwrap();
	let train_path = dir.path().join("processed").join("train.csv");
	let test_path = dir.path().join("processed").join("test.csv");
	std::fs::create_dir_all(dir.path().join("processed")).unwrap();
	std::fs::write(&train_path, "left over from a previous run\n").unwrap();
	let mut writer = SplitWriter::new(&train_path, &test_path, "is_top_decile", 0.25, 42);
	let first = writer
		.write_chunk(&labelled_chunk(vec![0, 1, 2, 3], vec![0.0, 1.0, 0.0, 1.0]))
		.unwrap();
	let second = writer
		.write_chunk(&labelled_chunk(vec![4, 5, 6, 7], vec![1.0, 0.0, 1.0, 0.0]))
		.unwrap();
	assert_eq!(first.n_train_rows + first.n_test_rows, 4);
	assert_eq!(second.n_test_rows, 1);
	let train = std::fs::read_to_string(&train_path).unwrap();
	let test = std::fs::read_to_string(&test_path).unwrap();
	for contents in [&train, &test].iter() {
		let lines: Vec<&str> = contents.lines().collect();
		assert_eq!(lines[0], ",title,is_top_decile");
		assert_eq!(lines.iter().filter(|line| line.contains("title")).count(), 1);
	}
	assert_eq!(train.lines().count() + test.lines().count(), 2 + 8);
}

#[test]
fn test_split_writer_rejects_changed_columns() {
	let dir = tempfile::tempdir().unwrap();
	let mut writer = SplitWriter::new(
		&dir.path().join("train.csv"),
		&dir.path().join("test.csv"),
		"is_top_decile",
		0.25,
		42,
	);
	writer
		.write_chunk(&labelled_chunk(vec![0, 1], vec![0.0, 1.0]))
		.unwrap();
	let mut changed = labelled_chunk(vec![2, 3], vec![0.0, 1.0]);
	changed.rename_column("title", "headline");
	assert!(matches!(
		writer.write_chunk(&changed),
		Err(Error::Schema(_))
	));
}

#[test]
fn test_split_writer_without_chunks_clears_tables() {
	let dir = tempfile::tempdir().unwrap();
	let train_path = dir.path().join("train.csv");
	let test_path = dir.path().join("test.csv");
	std::fs::write(&train_path, ",title\n0,left over\n").unwrap();
	std::fs::write(&test_path, ",title\n1,left over\n").unwrap();
	let writer = SplitWriter::new(&train_path, &test_path, "is_top_decile", 0.25, 42);
	writer.finish().unwrap();
	let header = format!(",{}\n", processed_column_names().join(","));
	assert_eq!(std::fs::read_to_string(&train_path).unwrap(), header);
	assert_eq!(std::fs::read_to_string(&test_path).unwrap(), header);
}

#[test]
fn test_split_writer_finish_keeps_written_chunks() {
	let dir = tempfile::tempdir().unwrap();
	let train_path = dir.path().join("train.csv");
	let test_path = dir.path().join("test.csv");
	let mut writer = SplitWriter::new(&train_path, &test_path, "is_top_decile", 0.25, 42);
	writer
		.write_chunk(&labelled_chunk(vec![0, 1, 2, 3], vec![0.0, 1.0, 0.0, 1.0]))
		.unwrap();
	let before = std::fs::read_to_string(&train_path).unwrap();
	writer.finish().unwrap();
	assert_eq!(std::fs::read_to_string(&train_path).unwrap(), before);
}
