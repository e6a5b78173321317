use std::path::Path;
use upvote_core::{
	config::FeatureSource, evaluate, model::Artifact, model::ModelArtifact, preprocess, train,
	Config, DataPaths, Error, LocalStorageRoot,
};
use upvote_features::TfidfVectorizer;

const N_ROWS: usize = 240;
const RAW_HEADER: &str = "id,title,selftext,link_flair_text,is_self,thumbnail,author,hour,minute,dayofweek,dayofyear,gilded,score,is_top_median,is_top_decile,is_top_percent";
const FLAIRS: &[&str] = &[
	"Discussion",
	"Discusssion",
	"Project",
	"Research",
	"",
	"News",
	"Shameless Self Promo",
	"Inaccurate",
	"Misleading",
	"Clickbait",
];

fn write_raw_table(path: &Path) {
	let mut csv = format!("{}\n", RAW_HEADER);
	for i in 0..N_ROWS {
		let popular = i % 3 == 0;
		let title = if i == 7 {
			"[deleted by user]".to_owned()
		} else if popular {
			format!("Amazing breakthrough results {}", i)
		} else {
			format!("Question about my code {}", i)
		};
		let body = match i {
			100 => "[removed]",
			_ if i % 4 == 0 => "",
			_ => "some body text",
		};
		let thumbnail = match i % 3 {
			0 => "https://i.example/thumb.jpg",
			1 => "self",
			_ => "default",
		};
		csv.push_str(&format!(
			"t3_{},{},{},{},{},{},user{},{},{},{},{},0,{},{},{},0\n",
			i,
			title,
			body,
			FLAIRS[i % FLAIRS.len()],
			if body.is_empty() { "False" } else { "True" },
			thumbnail,
			i,
			i % 24,
			i % 60,
			i % 7,
			1 + i % 366,
			if popular { 500 } else { 3 },
			if popular { 1 } else { 0 },
			if popular { 1 } else { 0 },
		));
	}
	std::fs::create_dir_all(path.parent().unwrap()).unwrap();
	std::fs::write(path, csv).unwrap();
}

fn config(root: &Path, target: &str, use_text: bool, use_number_category: bool) -> Config {
	let yaml = format!(
		"
pre_process:
  chunk_size: 50
  target_col: {}
train:
  loss: log
  use_text_cols: {}
  use_number_category_cols: {}
  learning_rate: 0.01
paths:
  storage_root: {}
",
		target,
		use_text,
		use_number_category,
		root.display()
	);
	Config::from_yaml(&yaml).unwrap()
}

fn setup(
	target: &str,
	use_text: bool,
	use_number_category: bool,
) -> (tempfile::TempDir, Config, DataPaths) {
	let dir = tempfile::tempdir().unwrap();
	let config = config(dir.path(), target, use_text, use_number_category);
	let provider = LocalStorageRoot::from_config(&config.paths);
	let paths = DataPaths::resolve(&provider, &config.paths).unwrap();
	write_raw_table(&paths.raw);
	(dir, config, paths)
}

fn assert_unit_interval(value: f32) {
	assert!((0.0..=1.0).contains(&value), "{}", value);
}

fn run_pipeline(use_text: bool, use_number_category: bool) -> (tempfile::TempDir, DataPaths, f32) {
	let (dir, config, paths) = setup("is_top_decile", use_text, use_number_category);

	let split = preprocess(&config, &paths).unwrap();
	assert_eq!(split.n_chunks, 5);
	assert_eq!(split.n_rows_read, N_ROWS);
	assert_eq!(split.n_rows_kept, N_ROWS - 2);
	// ceil(0.25 * n) test rows per chunk of 49, 50, 49, 50 and 40 kept rows
	assert_eq!(split.n_test_rows, 13 + 13 + 13 + 13 + 10);
	assert_eq!(split.n_train_rows, N_ROWS - 2 - split.n_test_rows);
	let train_table = std::fs::read_to_string(&paths.train).unwrap();
	assert!(train_table.starts_with(",title,body,is_self,thumbnail,hour"));
	assert_eq!(train_table.matches("title_and_body").count(), 1);

	let summary = train(&config, &paths).unwrap();
	assert_eq!(summary.n_examples, split.n_train_rows);
	assert!(paths.model.exists());
	assert_eq!(paths.tfidf.exists(), use_text);
	assert!(paths.train_metrics.exists());
	assert!(paths.result.exists());
	let model = ModelArtifact::from_path(&paths.model).unwrap();
	assert_eq!(model.feature_source, config.feature_source());
	assert_eq!(model.feature_names.len(), summary.n_features);
	if use_text {
		let vectorizer = TfidfVectorizer::from_path(&paths.tfidf).unwrap();
		assert_eq!(Some(vectorizer.vocabulary_len()), summary.vocabulary_len);
	}

	let summary = evaluate(&config, &paths).unwrap();
	assert_eq!(summary.n_examples, split.n_test_rows);
	let metrics = &summary.metrics;
	for value in [
		metrics.roc_auc,
		metrics.average_precision,
		metrics.accuracy,
		metrics.precision,
		metrics.recall,
		metrics.f1,
	]
	.iter()
	{
		assert_unit_interval(*value);
	}
	let report = std::fs::read_to_string(&paths.test_metrics).unwrap();
	assert!(report.contains("test__roc_auc"));
	let result = std::fs::read_to_string(&paths.result).unwrap();
	assert!(result.contains(config.feature_source().description()));
	(dir, paths, metrics.roc_auc)
}

#[test]
fn test_number_category_pipeline() {
	run_pipeline(false, true);
}

#[test]
fn test_text_pipeline() {
	let (_dir, _, roc_auc) = run_pipeline(true, false);
	assert!(roc_auc > 0.9, "{}", roc_auc);
}

#[test]
fn test_combined_pipeline() {
	let (_dir, paths, _) = run_pipeline(true, true);
	let model = ModelArtifact::from_path(&paths.model).unwrap();
	assert_eq!(model.feature_source, FeatureSource::Combined);
	assert_eq!(model.feature_names[0], "title_len");
	assert!(model.feature_names[16].starts_with("title_and_body["));
}

#[test]
fn test_preprocess_rerun_overwrites_outputs() {
	let (_dir, config, paths) = setup("is_top_decile", false, true);
	preprocess(&config, &paths).unwrap();
	let first = std::fs::read_to_string(&paths.train).unwrap();
	preprocess(&config, &paths).unwrap();
	let second = std::fs::read_to_string(&paths.train).unwrap();
	assert_eq!(first, second);
}

#[test]
fn test_preprocess_rerun_on_empty_raw_table_clears_outputs() {
	let (_dir, config, paths) = setup("is_top_decile", false, true);
	let first = preprocess(&config, &paths).unwrap();
	assert!(first.n_train_rows > 0 && first.n_test_rows > 0);
	std::fs::write(&paths.raw, format!("{}\n", RAW_HEADER)).unwrap();
	let second = preprocess(&config, &paths).unwrap();
	assert_eq!(second.n_chunks, 0);
	for path in [&paths.train, &paths.test].iter() {
		let table = std::fs::read_to_string(path).unwrap();
		assert_eq!(table.lines().count(), 1, "{}", table);
		assert!(table.starts_with(",title,body,is_self,thumbnail,hour"));
	}
	assert!(matches!(train(&config, &paths), Err(Error::Schema(_))));
}

#[test]
fn test_evaluate_rejects_other_feature_source() {
	let (dir, config, paths) = setup("is_top_decile", false, true);
	preprocess(&config, &paths).unwrap();
	train(&config, &paths).unwrap();
	let text_config = self::config(dir.path(), "is_top_decile", true, false);
	assert!(matches!(
		evaluate(&text_config, &paths),
		Err(Error::Config(_))
	));
}

#[test]
fn test_single_class_metrics_are_undefined() {
	let (_dir, config, paths) = setup("is_top_percent", false, true);
	preprocess(&config, &paths).unwrap();
	assert!(matches!(
		train(&config, &paths),
		Err(Error::MetricUndefined(_))
	));
}

#[test]
fn test_missing_raw_table() {
	let (_dir, config, paths) = setup("is_top_decile", false, true);
	std::fs::remove_file(&paths.raw).unwrap();
	assert!(matches!(
		preprocess(&config, &paths),
		Err(Error::Io { .. })
	));
}
