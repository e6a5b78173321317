use fnv::FnvHashMap;
use upvote_dataframe::NumberColumn;

/**
A `OneHotEncoder` creates one number column for each option in a fixed, closed set of options. For each example, all of the columns have the value 0.0, except the column corresponding to the example's value, which has the value 1.0. Values outside the options produce all zeros. Because the options are fixed up front, every chunk encoded with the same encoder has the same columns, whichever options happen to appear in it.

# Example

With options `["red", "green", "blue"]` and prefix `"color"`, the columns are `color_red`, `color_green` and `color_blue`:

| value       | feature values |
|-------------|----------------|
| "red"       | [1, 0, 0]      |
| "green"     | [0, 1, 0]      |
| "blue"      | [0, 0, 1]      |
| "purple"    | [0, 0, 0]      |
*/
#[derive(Clone, Debug)]
pub struct OneHotEncoder {
	prefix: String,
	options: Vec<String>,
	options_map: FnvHashMap<String, usize>,
}

#[derive(Debug)]
pub struct OneHotEncoderOutput {
	/// One column per option, in option order.
	pub columns: Vec<NumberColumn>,
	/// The number of values that matched none of the options.
	pub n_unknown: usize,
}

impl OneHotEncoder {
	pub fn new(prefix: &str, options: &[&str]) -> Self {
		let options: Vec<String> = options.iter().map(|option| (*option).to_owned()).collect();
		let options_map = options
			.iter()
			.enumerate()
			.map(|(index, option)| (option.clone(), index))
			.collect();
		Self {
			prefix: prefix.to_owned(),
			options,
			options_map,
		}
	}

	pub fn options(&self) -> &[String] {
		&self.options
	}

	pub fn column_names(&self) -> Vec<String> {
		self.options
			.iter()
			.map(|option| format!("{}_{}", self.prefix, option))
			.collect()
	}

	pub fn encode<'a>(&self, values: impl Iterator<Item = &'a str>) -> OneHotEncoderOutput {
		let mut data: Vec<Vec<f32>> = vec![Vec::new(); self.options.len()];
		let mut n_unknown = 0;
		for value in values {
			let position = self.options_map.get(value).copied();
			if position.is_none() {
				n_unknown += 1;
			}
			for (option_index, column) in data.iter_mut().enumerate() {
				column.push(if position == Some(option_index) { 1.0 } else { 0.0 });
			}
		}
		let columns = self
			.column_names()
			.into_iter()
			.zip(data)
			.map(|(name, data)| NumberColumn::new(name, data))
			.collect();
		OneHotEncoderOutput { columns, n_unknown }
	}
}

#[test]
fn test_one_hot_encoder() {
	let encoder = OneHotEncoder::new("color", &["red", "green", "blue"]);
	let output = encoder.encode(vec!["green", "purple", "red"].into_iter());
	assert_eq!(output.n_unknown, 1);
	let data: Vec<Vec<f32>> = output.columns.iter().map(|c| c.data.clone()).collect();
	assert_eq!(
		data,
		vec![
			vec![0.0, 0.0, 1.0],
			vec![1.0, 0.0, 0.0],
			vec![0.0, 0.0, 0.0]
		]
	);
	insta::assert_debug_snapshot!(encoder.column_names(), @r###"
 [
     "color_red",
     "color_green",
     "color_blue",
 ]
 "###);
}

#[test]
fn test_one_hot_encoder_columns_do_not_depend_on_values() {
	let encoder = OneHotEncoder::new("color", &["red", "green", "blue"]);
	let empty = encoder.encode(std::iter::empty());
	let full = encoder.encode(vec!["blue"].into_iter());
	let names = |output: &OneHotEncoderOutput| -> Vec<String> {
		output.columns.iter().map(|c| c.name.clone()).collect()
	};
	assert_eq!(names(&empty), names(&full));
	assert!(empty.columns.iter().all(|c| c.data.is_empty()));
}
