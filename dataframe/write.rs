use super::*;
use std::{fs::OpenOptions, io::Write, path::Path};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
	/// Replace the file's contents.
	Truncate,
	/// Add rows after the file's existing contents.
	Append,
}

#[derive(Clone, Copy, Debug)]
pub struct ToCsvOptions {
	pub mode: WriteMode,
	/// Write the column names as the first record.
	pub header: bool,
	/// Write the row index as an unnamed first column.
	pub index: bool,
}

impl DataFrame {
	pub fn to_path(&self, path: &Path, options: ToCsvOptions) -> Result<()> {
		let file = OpenOptions::new()
			.create(true)
			.write(true)
			.append(options.mode == WriteMode::Append)
			.truncate(options.mode == WriteMode::Truncate)
			.open(path)
			.map_err(|source| Error::Open {
				path: path.to_owned(),
				source,
			})?;
		let mut writer = csv::Writer::from_writer(std::io::BufWriter::new(file));
		self.to_csv(&mut writer, options.header, options.index)
			.and_then(|_| writer.flush().map_err(csv::Error::from))
			.map_err(|source| Error::Write {
				path: path.to_owned(),
				source,
			})
	}

	pub fn to_csv<W>(
		&self,
		writer: &mut csv::Writer<W>,
		header: bool,
		index: bool,
	) -> csv::Result<()>
	where
		W: Write,
	{
		if header {
			let index_name = if index { Some("") } else { None };
			writer.write_record(index_name.into_iter().chain(self.column_names()))?;
		}
		for row in 0..self.nrows() {
			if index {
				writer.write_field(self.index[row].to_string())?;
			}
			for column in self.columns.iter() {
				match column {
					Column::Number(column) => writer.write_field(format_number(column.data[row]))?,
					Column::Text(column) => {
						writer.write_field(column.data[row].as_deref().unwrap_or(""))?
					}
				}
			}
			writer.write_record(None::<&[u8]>)?;
		}
		Ok(())
	}
}

/// Integral values are written without a fractional part and missing values are written as empty fields.
fn format_number(value: f32) -> String {
	if value.is_nan() {
		String::new()
	} else if value.fract() == 0.0 && value.abs() < 1e15 {
		(value as i64).to_string()
	} else {
		lexical::to_string(value)
	}
}

#[test]
fn test_format_number() {
	assert_eq!(format_number(3.0), "3");
	assert_eq!(format_number(-2.0), "-2");
	assert_eq!(format_number(0.5), "0.5");
	assert_eq!(format_number(std::f32::NAN), "");
}

#[test]
fn test_header_once_then_append() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("out.csv");
	let chunk = |index: Vec<u64>, titles: Vec<&str>, scores: Vec<f32>| {
		DataFrame::new(
			index,
			vec![
				Column::Text(TextColumn::new(
					"title".to_owned(),
					titles.into_iter().map(|t| Some(t.to_owned())).collect(),
				)),
				Column::Number(NumberColumn::new("score".to_owned(), scores)),
			],
		)
	};
	let first = ToCsvOptions {
		mode: WriteMode::Truncate,
		header: true,
		index: true,
	};
	let rest = ToCsvOptions {
		mode: WriteMode::Append,
		header: false,
		index: true,
	};
	std::fs::write(&path, "stale contents\n").unwrap();
	chunk(vec![0, 1], vec!["a", "b, c"], vec![1.0, 2.5])
		.to_path(&path, first)
		.unwrap();
	chunk(vec![4], vec!["d"], vec![std::f32::NAN])
		.to_path(&path, rest)
		.unwrap();
	let contents = std::fs::read_to_string(&path).unwrap();
	assert_eq!(contents, ",title,score\n0,a,1\n1,\"b, c\",2.5\n4,d,\n");
}
