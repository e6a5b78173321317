/*!
This crate provides a small column-oriented dataframe used to hold one chunk of a delimited table at a time. Chunks are produced lazily by [`CsvChunks`](struct.CsvChunks.html) and written back with [`DataFrame::to_path`](struct.DataFrame.html#method.to_path), so a table of any size can be processed with memory proportional to the chunk size.
*/

#![allow(clippy::tabs_in_doc_comments)]

use itertools::izip;

mod error;
mod load;
mod write;

pub use self::error::Error;
pub use self::load::*;
pub use self::write::*;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A `DataFrame` holds equal-length columns plus a row index, which records the position of each row in the table it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub index: Vec<u64>,
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Number(NumberColumn),
	Text(TextColumn),
}

/// Missing values are stored as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f32>,
}

/// Missing values are stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
	Number,
	Text,
}

impl std::fmt::Display for ColumnType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ColumnType::Number => write!(f, "number"),
			ColumnType::Text => write!(f, "text"),
		}
	}
}

impl DataFrame {
	pub fn new(index: Vec<u64>, columns: Vec<Column>) -> Self {
		debug_assert!(columns.iter().all(|column| column.len() == index.len()));
		Self { index, columns }
	}

	/// Create an empty dataframe with the given column names and types.
	pub fn empty(column_names: &[String], column_types: &[ColumnType]) -> Self {
		let columns = izip!(column_names, column_types)
			.map(|(name, column_type)| Column::empty(name.clone(), *column_type))
			.collect();
		Self {
			index: Vec::new(),
			columns,
		}
	}

	pub fn nrows(&self) -> usize {
		self.index.len()
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|column| column.name()).collect()
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
		self.columns.iter_mut().find(|column| column.name() == name)
	}

	pub fn number_column(&self, name: &str) -> Result<&NumberColumn> {
		match self.column(name) {
			Some(Column::Number(column)) => Ok(column),
			Some(Column::Text(_)) => Err(Error::ColumnType {
				name: name.to_owned(),
				expected: ColumnType::Number,
			}),
			None => Err(Error::ColumnNotFound(name.to_owned())),
		}
	}

	pub fn text_column(&self, name: &str) -> Result<&TextColumn> {
		match self.column(name) {
			Some(Column::Text(column)) => Ok(column),
			Some(Column::Number(_)) => Err(Error::ColumnType {
				name: name.to_owned(),
				expected: ColumnType::Text,
			}),
			None => Err(Error::ColumnNotFound(name.to_owned())),
		}
	}

	pub fn number_column_mut(&mut self, name: &str) -> Result<&mut NumberColumn> {
		match self.column_mut(name) {
			Some(Column::Number(column)) => Ok(column),
			Some(Column::Text(_)) => Err(Error::ColumnType {
				name: name.to_owned(),
				expected: ColumnType::Number,
			}),
			None => Err(Error::ColumnNotFound(name.to_owned())),
		}
	}

	pub fn text_column_mut(&mut self, name: &str) -> Result<&mut TextColumn> {
		match self.column_mut(name) {
			Some(Column::Text(column)) => Ok(column),
			Some(Column::Number(_)) => Err(Error::ColumnType {
				name: name.to_owned(),
				expected: ColumnType::Text,
			}),
			None => Err(Error::ColumnNotFound(name.to_owned())),
		}
	}

	/// Remove a column and return it.
	pub fn remove_column(&mut self, name: &str) -> Option<Column> {
		let position = self
			.columns
			.iter()
			.position(|column| column.name() == name)?;
		Some(self.columns.remove(position))
	}

	/// Keep exactly the named columns, in the given order. Every name must be present.
	pub fn select_columns(&mut self, names: &[&str]) -> Result<()> {
		let mut columns = Vec::with_capacity(names.len());
		for name in names {
			let column = self
				.remove_column(name)
				.ok_or_else(|| Error::ColumnNotFound((*name).to_owned()))?;
			columns.push(column);
		}
		self.columns = columns;
		Ok(())
	}

	/// Remove the named columns. Every name must be present.
	pub fn drop_columns(&mut self, names: &[&str]) -> Result<()> {
		for name in names {
			if self.column(name).is_none() {
				return Err(Error::ColumnNotFound((*name).to_owned()));
			}
		}
		self.columns
			.retain(|column| !names.contains(&column.name()));
		Ok(())
	}

	/// Rename a column. Renaming a column that does not exist is a no-op, and the return value reports whether a column was renamed.
	pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
		match self.column_mut(from) {
			Some(column) => {
				column.set_name(to.to_owned());
				true
			}
			None => false,
		}
	}

	/// Append a column, replacing any existing column with the same name in place.
	pub fn push_column(&mut self, column: Column) {
		debug_assert_eq!(column.len(), self.nrows());
		match self
			.columns
			.iter_mut()
			.find(|existing| existing.name() == column.name())
		{
			Some(existing) => *existing = column,
			None => self.columns.push(column),
		}
	}

	/// Keep only the rows where `mask` is true.
	pub fn retain_rows(&mut self, mask: &[bool]) {
		debug_assert_eq!(mask.len(), self.nrows());
		retain_by_mask(&mut self.index, mask);
		for column in self.columns.iter_mut() {
			match column {
				Column::Number(column) => retain_by_mask(&mut column.data, mask),
				Column::Text(column) => retain_by_mask(&mut column.data, mask),
			}
		}
	}

	/// Create a new dataframe containing the rows at `indices`, in that order.
	pub fn select_rows(&self, indices: &[usize]) -> DataFrame {
		let index = indices.iter().map(|i| self.index[*i]).collect();
		let columns = self
			.columns
			.iter()
			.map(|column| match column {
				Column::Number(column) => Column::Number(NumberColumn {
					name: column.name.clone(),
					data: indices.iter().map(|i| column.data[*i]).collect(),
				}),
				Column::Text(column) => Column::Text(TextColumn {
					name: column.name.clone(),
					data: indices.iter().map(|i| column.data[*i].clone()).collect(),
				}),
			})
			.collect();
		DataFrame { index, columns }
	}
}

fn retain_by_mask<T>(values: &mut Vec<T>, mask: &[bool]) {
	let mut mask = mask.iter();
	values.retain(|_| *mask.next().unwrap_or(&false));
}

impl Column {
	pub fn empty(name: String, column_type: ColumnType) -> Self {
		match column_type {
			ColumnType::Number => Column::Number(NumberColumn::new(name, Vec::new())),
			ColumnType::Text => Column::Text(TextColumn::new(name, Vec::new())),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Column::Number(column) => column.name.as_str(),
			Column::Text(column) => column.name.as_str(),
		}
	}

	fn set_name(&mut self, name: String) {
		match self {
			Column::Number(column) => column.name = name,
			Column::Text(column) => column.name = name,
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Column::Number(column) => column.data.len(),
			Column::Text(column) => column.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn column_type(&self) -> ColumnType {
		match self {
			Column::Number(_) => ColumnType::Number,
			Column::Text(_) => ColumnType::Text,
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Column::Number(column) => Some(column),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumn> {
		match self {
			Column::Text(column) => Some(column),
			_ => None,
		}
	}
}

impl NumberColumn {
	pub fn new(name: String, data: Vec<f32>) -> Self {
		Self { name, data }
	}
}

impl TextColumn {
	pub fn new(name: String, data: Vec<Option<String>>) -> Self {
		Self { name, data }
	}

	/// Iterate over the values, yielding the empty string for missing values.
	pub fn iter_or_empty(&self) -> impl Iterator<Item = &str> {
		self.data
			.iter()
			.map(|value| value.as_deref().unwrap_or(""))
	}
}

#[cfg(test)]
fn test_dataframe() -> DataFrame {
	DataFrame::new(
		vec![0, 1, 2],
		vec![
			Column::Text(TextColumn::new(
				"title".to_owned(),
				vec![Some("a".to_owned()), None, Some("c".to_owned())],
			)),
			Column::Number(NumberColumn::new("score".to_owned(), vec![1.0, 2.0, 3.0])),
		],
	)
}

#[test]
fn test_retain_and_select_rows() {
	let mut df = test_dataframe();
	df.retain_rows(&[true, false, true]);
	assert_eq!(df.index, vec![0, 2]);
	assert_eq!(df.number_column("score").unwrap().data, vec![1.0, 3.0]);
	let selected = df.select_rows(&[1]);
	assert_eq!(selected.index, vec![2]);
	assert_eq!(
		selected.text_column("title").unwrap().data,
		vec![Some("c".to_owned())]
	);
}

#[test]
fn test_column_lookup_errors() {
	let mut df = test_dataframe();
	assert!(matches!(
		df.number_column("title"),
		Err(Error::ColumnType { .. })
	));
	assert!(matches!(
		df.text_column("missing"),
		Err(Error::ColumnNotFound(_))
	));
	assert!(df.drop_columns(&["missing"]).is_err());
	assert!(df.rename_column("title", "headline"));
	assert!(!df.rename_column("title", "headline"));
	df.drop_columns(&["headline"]).unwrap();
	insta::assert_debug_snapshot!(df.column_names(), @r###"
 [
     "score",
 ]
 "###);
}

#[test]
fn test_select_columns() {
	let mut df = test_dataframe();
	df.select_columns(&["score", "title"]).unwrap();
	assert_eq!(df.column_names(), vec!["score", "title"]);
	df.select_columns(&["score"]).unwrap();
	assert_eq!(df.column_names(), vec!["score"]);
	assert!(matches!(
		df.select_columns(&["title"]),
		Err(Error::ColumnNotFound(_))
	));
}

#[test]
fn test_push_column_replaces_in_place() {
	let mut df = test_dataframe();
	df.push_column(Column::Number(NumberColumn::new(
		"title".to_owned(),
		vec![0.0, 0.0, 0.0],
	)));
	assert_eq!(df.column_names(), vec!["title", "score"]);
	assert!(df.number_column("title").is_ok());
}
