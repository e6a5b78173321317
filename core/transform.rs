use crate::{
	schema::{processed_column_names, FLAIR_PREFIX, FLAIR_VOCABULARY, TEXT_FEATURE_COLUMN},
	Error, Result,
};
use num_traits::ToPrimitive;
use upvote_dataframe::{Column, DataFrame, NumberColumn, TextColumn};
use upvote_features::OneHotEncoder;

const DELETED_TITLES: &[&str] = &["[deleted by user]"];
const DELETED_BODIES: &[&str] = &["[deleted]", "[removed]"];
const THUMBNAILS_WITHOUT_IMAGE: &[&str] = &["self", "default"];

/**
Turn a chunk of raw posts into a chunk of the processed table. The output has the columns of [`processed_column_names`](../schema/fn.processed_column_names.html) in that order, whatever flairs the chunk contains, and rows whose content was deleted or removed are dropped. The same input always produces the same output.
*/
pub fn transform_chunk(mut dataframe: DataFrame) -> Result<DataFrame> {
	dataframe.drop_columns(&["id", "author"])?;
	rename_required(&mut dataframe, "selftext", "body")?;
	rename_required(&mut dataframe, "link_flair_text", "flair")?;

	let title_len = char_counts(dataframe.text_column("title")?, "title_len");
	let body_len = char_counts(dataframe.text_column("body")?, "body_len");
	dataframe.push_column(Column::Number(title_len));
	dataframe.push_column(Column::Number(body_len));

	let has_thumbnail = dataframe
		.text_column("thumbnail")?
		.data
		.iter()
		.map(|thumbnail| match thumbnail.as_deref() {
			Some(thumbnail) if THUMBNAILS_WITHOUT_IMAGE.contains(&thumbnail) => 0.0,
			_ => 1.0,
		})
		.collect();
	dataframe.push_column(Column::Number(NumberColumn::new(
		"has_thumbnail".to_owned(),
		has_thumbnail,
	)));

	for body in dataframe.text_column_mut("body")?.data.iter_mut() {
		body.get_or_insert_with(String::new);
	}
	for flair in dataframe.text_column_mut("flair")?.data.iter_mut() {
		let replacement = match flair.as_deref() {
			None => Some("None"),
			Some("Discusssion") => Some("Discussion"),
			Some(_) => None,
		};
		if let Some(replacement) = replacement {
			*flair = Some(replacement.to_owned());
		}
	}

	let encoder = OneHotEncoder::new(FLAIR_PREFIX, &FLAIR_VOCABULARY);
	let output = encoder.encode(dataframe.text_column("flair")?.iter_or_empty());
	if output.n_unknown > 0 {
		tracing::warn!(
			n_rows = output.n_unknown,
			"flair outside the known categories, all flair columns set to 0"
		);
	}
	for column in output.columns {
		dataframe.push_column(Column::Number(column));
	}
	dataframe.remove_column("flair");

	let keep: Vec<bool> = dataframe
		.text_column("title")?
		.data
		.iter()
		.zip(dataframe.text_column("body")?.data.iter())
		.map(|(title, body)| {
			let deleted_title = title
				.as_deref()
				.map_or(false, |title| DELETED_TITLES.contains(&title));
			let deleted_body = body
				.as_deref()
				.map_or(false, |body| DELETED_BODIES.contains(&body));
			!deleted_title && !deleted_body
		})
		.collect();
	dataframe.retain_rows(&keep);

	let title_and_body = dataframe
		.text_column("title")?
		.iter_or_empty()
		.zip(dataframe.text_column("body")?.iter_or_empty())
		.map(|(title, body)| Some(format!("{} {}", title, body)))
		.collect();
	dataframe.push_column(Column::Text(TextColumn::new(
		TEXT_FEATURE_COLUMN.to_owned(),
		title_and_body,
	)));

	let column_names = processed_column_names();
	let column_names: Vec<&str> = column_names.iter().map(String::as_str).collect();
	dataframe.select_columns(&column_names)?;
	Ok(dataframe)
}

fn rename_required(dataframe: &mut DataFrame, from: &str, to: &str) -> Result<()> {
	if dataframe.rename_column(from, to) {
		Ok(())
	} else {
		Err(Error::Schema(format!("column \"{}\" not found", from)))
	}
}

/// Missing values count as the empty string.
fn char_counts(column: &TextColumn, name: &str) -> NumberColumn {
	let data = column
		.iter_or_empty()
		.map(|value| value.chars().count().to_f32().unwrap_or(std::f32::MAX))
		.collect();
	NumberColumn::new(name.to_owned(), data)
}

#[cfg(test)]
const RAW_HEADER: &str = "id,title,selftext,link_flair_text,is_self,thumbnail,author,hour,minute,dayofweek,dayofyear,gilded,score,is_top_median,is_top_decile,is_top_percent";

#[cfg(test)]
fn raw_chunk(rows: &[&str]) -> DataFrame {
	let csv = std::iter::once(RAW_HEADER)
		.chain(rows.iter().copied())
		.collect::<Vec<_>>()
		.join("\n");
	let mut chunks = upvote_dataframe::CsvChunks::from_reader(
		std::path::Path::new("raw.csv"),
		csv.as_bytes(),
		1000,
		&crate::schema::raw_csv_options(),
	)
	.unwrap();
	chunks.next().unwrap().unwrap()
}

#[cfg(test)]
fn number_data(dataframe: &DataFrame, name: &str) -> Vec<f32> {
	dataframe.number_column(name).unwrap().data.clone()
}

#[test]
fn test_flair_one_hot_encoding() {
	let raw = raw_chunk(&[
		"a1,First,body one,Discussion,True,self,u1,1,2,3,4,0,10,1,0,0",
		"a2,Second,body two,Discusssion,True,self,u2,1,2,3,4,0,10,1,0,0",
		"a3,Third,,Project,False,https://i.example/a.jpg,u3,1,2,3,4,0,10,1,0,0",
		"a4,Fourth,body four,,True,default,u4,1,2,3,4,0,10,1,1,0",
	]);
	let processed = transform_chunk(raw).unwrap();
	assert_eq!(processed.nrows(), 4);
	assert_eq!(
		number_data(&processed, "flair_Discussion"),
		vec![1.0, 1.0, 0.0, 0.0]
	);
	assert_eq!(
		number_data(&processed, "flair_Project"),
		vec![0.0, 0.0, 1.0, 0.0]
	);
	assert_eq!(number_data(&processed, "flair_None"), vec![0.0, 0.0, 0.0, 1.0]);
	for flair in FLAIR_VOCABULARY.iter() {
		if !["Discussion", "Project", "None"].contains(flair) {
			let name = format!("flair_{}", flair);
			assert_eq!(number_data(&processed, &name), vec![0.0; 4], "{}", name);
		}
	}
}

#[test]
fn test_deleted_title_is_dropped() {
	let rows = [
		"a1,Kept,body,News,True,self,u1,1,2,3,4,0,10,1,0,0",
		"a2,[deleted by user],body,News,True,self,u2,1,2,3,4,0,10,1,0,0",
		"a3,Also kept,body,News,True,self,u3,1,2,3,4,0,10,1,0,0",
	];
	let processed = transform_chunk(raw_chunk(&rows)).unwrap();
	assert_eq!(processed.nrows(), rows.len() - 1);
	assert_eq!(processed.index, vec![0, 2]);
}

#[test]
fn test_deleted_and_removed_bodies_are_dropped() {
	let processed = transform_chunk(raw_chunk(&[
		"a1,One,[deleted],News,True,self,u1,1,2,3,4,0,10,1,0,0",
		"a2,Two,[removed],News,True,self,u2,1,2,3,4,0,10,1,0,0",
		"a3,Three,fine,News,True,self,u3,1,2,3,4,0,10,1,0,0",
	]))
	.unwrap();
	assert_eq!(processed.index, vec![2]);
}

#[test]
fn test_derived_columns() {
	let processed = transform_chunk(raw_chunk(&[
		"a1,Héllo,two words,Research,True,self,u1,1,2,3,4,0,10,1,0,0",
		"a2,x,,Research,False,default,u2,1,2,3,4,0,10,1,0,0",
		"a3,yz,body,Research,False,https://i.example/b.png,u3,1,2,3,4,0,10,1,0,0",
		"a4,w,body,Research,False,,u4,1,2,3,4,0,10,1,0,0",
	]))
	.unwrap();
	assert_eq!(number_data(&processed, "title_len"), vec![5.0, 1.0, 2.0, 1.0]);
	assert_eq!(number_data(&processed, "body_len"), vec![9.0, 0.0, 4.0, 4.0]);
	assert_eq!(
		number_data(&processed, "has_thumbnail"),
		vec![0.0, 0.0, 1.0, 1.0]
	);
	let title_and_body: Vec<&str> = processed
		.text_column("title_and_body")
		.unwrap()
		.iter_or_empty()
		.collect();
	assert_eq!(title_and_body, vec!["Héllo two words", "x ", "yz body", "w body"]);
}

#[test]
fn test_columns_do_not_depend_on_chunk_contents() {
	let with_flairs = transform_chunk(raw_chunk(&[
		"a1,One,body,Clickbait,True,self,u1,1,2,3,4,0,10,1,0,0",
		"a2,Two,body,Shameless Self Promo,True,self,u2,1,2,3,4,0,10,1,0,0",
	]))
	.unwrap();
	let without_flairs = transform_chunk(raw_chunk(&[
		"a3,Three,body,,True,self,u3,1,2,3,4,0,10,1,0,0",
	]))
	.unwrap();
	let empty = transform_chunk(raw_chunk(&[
		"a4,[deleted by user],body,,True,self,u4,1,2,3,4,0,10,1,0,0",
	]))
	.unwrap();
	assert_eq!(with_flairs.column_names(), without_flairs.column_names());
	assert_eq!(with_flairs.column_names(), empty.column_names());
	assert_eq!(empty.nrows(), 0);
	let expected = processed_column_names();
	assert_eq!(with_flairs.column_names(), expected);
}

#[test]
fn test_unknown_flair_sets_no_flair_column() {
	let processed = transform_chunk(raw_chunk(&[
		"a1,One,body,Meta,True,self,u1,1,2,3,4,0,10,1,0,0",
	]))
	.unwrap();
	for name in crate::schema::flair_column_names() {
		assert_eq!(number_data(&processed, &name), vec![0.0]);
	}
}

#[test]
fn test_transform_is_pure() {
	let raw = raw_chunk(&[
		"a1,One,body,Discusssion,True,self,u1,1,2,3,4,0,10,1,0,0",
		"a2,Two,,,False,https://i.example/c.gif,u2,5,6,0,200,1,99,1,1,1",
	]);
	let first = transform_chunk(raw.clone()).unwrap();
	let second = transform_chunk(raw).unwrap();
	assert_eq!(first, second);
}

#[test]
fn test_missing_column_is_a_schema_error() {
	let mut raw = raw_chunk(&["a1,One,body,News,True,self,u1,1,2,3,4,0,10,1,0,0"]);
	raw.remove_column("author");
	assert!(matches!(transform_chunk(raw), Err(Error::Schema(_))));
	let mut raw = raw_chunk(&["a1,One,body,News,True,self,u1,1,2,3,4,0,10,1,0,0"]);
	raw.remove_column("selftext");
	assert!(matches!(transform_chunk(raw), Err(Error::Schema(_))));
}
