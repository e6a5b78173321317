/*!
The column layout of the raw and processed tables. The processed layout is the same for every chunk of every run.
*/

use std::collections::BTreeMap;
use upvote_dataframe::{ColumnType, FromCsvOptions};

/// The flair categories that get a one hot column, in column order.
pub const FLAIR_VOCABULARY: [&str; 9] = [
	"Discussion",
	"Project",
	"Research",
	"None",
	"News",
	"Shameless Self Promo",
	"Inaccurate",
	"Misleading",
	"Clickbait",
];

pub const FLAIR_PREFIX: &str = "flair";

/// Numeric columns of the raw table. Every other column is read as text.
pub const RAW_NUMBER_COLUMNS: &[&str] = &[
	"hour",
	"minute",
	"dayofweek",
	"dayofyear",
	"gilded",
	"score",
	"is_top_median",
	"is_top_decile",
	"is_top_percent",
];

/// Columns copied from the raw table to the processed table, after renaming.
pub const PASSTHROUGH_COLUMNS: &[&str] = &[
	"title",
	"body",
	"is_self",
	"thumbnail",
	"hour",
	"minute",
	"dayofweek",
	"dayofyear",
	"gilded",
	"score",
	"is_top_median",
	"is_top_decile",
	"is_top_percent",
];

pub const DERIVED_NUMBER_COLUMNS: &[&str] = &["title_len", "body_len", "has_thumbnail"];

pub const TEXT_FEATURE_COLUMN: &str = "title_and_body";

pub const NUMBER_FEATURE_COLUMNS: &[&str] = &[
	"title_len",
	"body_len",
	"hour",
	"minute",
	"dayofweek",
	"dayofyear",
];

pub const CATEGORY_FEATURE_COLUMNS: &[&str] = &[
	"has_thumbnail",
	"flair_Clickbait",
	"flair_Discussion",
	"flair_Inaccurate",
	"flair_Misleading",
	"flair_News",
	"flair_None",
	"flair_Project",
	"flair_Research",
	"flair_Shameless Self Promo",
];

pub fn flair_column_names() -> Vec<String> {
	FLAIR_VOCABULARY
		.iter()
		.map(|flair| format!("{}_{}", FLAIR_PREFIX, flair))
		.collect()
}

/// The columns of every processed chunk, in order.
pub fn processed_column_names() -> Vec<String> {
	PASSTHROUGH_COLUMNS
		.iter()
		.chain(DERIVED_NUMBER_COLUMNS.iter())
		.map(|name| (*name).to_owned())
		.chain(flair_column_names())
		.chain(std::iter::once(TEXT_FEATURE_COLUMN.to_owned()))
		.collect()
}

/// The dense feature columns, number columns first.
pub fn dense_feature_column_names() -> Vec<&'static str> {
	NUMBER_FEATURE_COLUMNS
		.iter()
		.chain(CATEGORY_FEATURE_COLUMNS.iter())
		.copied()
		.collect()
}

pub fn raw_csv_options() -> FromCsvOptions {
	number_columns_options(RAW_NUMBER_COLUMNS.iter().map(|name| (*name).to_owned()))
}

pub fn processed_csv_options() -> FromCsvOptions {
	let number_columns = RAW_NUMBER_COLUMNS
		.iter()
		.chain(DERIVED_NUMBER_COLUMNS.iter())
		.map(|name| (*name).to_owned())
		.chain(flair_column_names());
	number_columns_options(number_columns)
}

fn number_columns_options(names: impl Iterator<Item = String>) -> FromCsvOptions {
	let column_types: BTreeMap<String, ColumnType> =
		names.map(|name| (name, ColumnType::Number)).collect();
	FromCsvOptions {
		column_types,
		..Default::default()
	}
}

#[test]
fn test_processed_column_names() {
	insta::assert_debug_snapshot!(processed_column_names(), @r###"
 [
     "title",
     "body",
     "is_self",
     "thumbnail",
     "hour",
     "minute",
     "dayofweek",
     "dayofyear",
     "gilded",
     "score",
     "is_top_median",
     "is_top_decile",
     "is_top_percent",
     "title_len",
     "body_len",
     "has_thumbnail",
     "flair_Discussion",
     "flair_Project",
     "flair_Research",
     "flair_None",
     "flair_News",
     "flair_Shameless Self Promo",
     "flair_Inaccurate",
     "flair_Misleading",
     "flair_Clickbait",
     "title_and_body",
 ]
 "###);
}

#[test]
fn test_dense_features_are_processed_columns() {
	let processed = processed_column_names();
	let dense = dense_feature_column_names();
	assert_eq!(dense.len(), 16);
	for name in dense {
		assert!(processed.iter().any(|column| column == name), "{}", name);
	}
}
