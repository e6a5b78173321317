use super::{auc_roc, average_precision, Accuracy, StreamingMetric};
use itertools::izip;
use num_traits::ToPrimitive;

/**
`BinaryClassificationMetrics` accumulates the labels, predicted labels and predicted probabilities of every chunk of an evaluation pass. The order in which chunks arrive does not change the result. Labels and predictions are 0 or 1, and each probability is the probability of class 1.
*/
#[derive(Debug, Default)]
pub struct BinaryClassificationMetrics {
	labels: Vec<usize>,
	predictions: Vec<usize>,
	probabilities: Vec<f32>,
}

/// The input to [`BinaryClassificationMetrics`](struct.BinaryClassificationMetrics.html). All three slices have one entry per example.
pub struct BinaryClassificationMetricsInput<'a> {
	pub labels: &'a [usize],
	pub predictions: &'a [usize],
	pub probabilities: &'a [f32],
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BinaryClassificationMetricsOutput {
	pub roc_auc: f32,
	pub average_precision: f32,
	pub accuracy: f32,
	pub precision: f32,
	pub recall: f32,
	pub f1: f32,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum MetricUndefinedError {
	#[error("cannot compute metrics for an evaluation pass with no examples")]
	Empty,
	#[error("roc_auc and average_precision are undefined because every label in the evaluation pass is {label}")]
	SingleClass { label: usize },
}

impl BinaryClassificationMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn n_examples(&self) -> usize {
		self.labels.len()
	}
}

impl<'a> StreamingMetric<'a> for BinaryClassificationMetrics {
	type Input = BinaryClassificationMetricsInput<'a>;
	type Output = Result<BinaryClassificationMetricsOutput, MetricUndefinedError>;

	fn update(&mut self, input: BinaryClassificationMetricsInput<'a>) {
		debug_assert_eq!(input.labels.len(), input.predictions.len());
		debug_assert_eq!(input.labels.len(), input.probabilities.len());
		self.labels.extend_from_slice(input.labels);
		self.predictions.extend_from_slice(input.predictions);
		self.probabilities.extend_from_slice(input.probabilities);
	}

	fn merge(&mut self, other: Self) {
		self.labels.extend(other.labels);
		self.predictions.extend(other.predictions);
		self.probabilities.extend(other.probabilities);
	}

	fn finalize(self) -> Self::Output {
		let first_label = *self.labels.first().ok_or(MetricUndefinedError::Empty)?;
		let roc_auc = auc_roc(&self.probabilities, &self.labels).ok_or(
			MetricUndefinedError::SingleClass {
				label: first_label,
			},
		)?;
		let average_precision = average_precision(&self.probabilities, &self.labels).ok_or(
			MetricUndefinedError::SingleClass {
				label: first_label,
			},
		)?;
		let mut accuracy = Accuracy::new();
		let mut true_positives = 0u64;
		let mut false_positives = 0u64;
		let mut false_negatives = 0u64;
		for (prediction, label) in izip!(self.predictions.iter(), self.labels.iter()) {
			accuracy.update((*prediction, *label));
			match (*prediction, *label) {
				(1, 1) => true_positives += 1,
				(1, _) => false_positives += 1,
				(_, 1) => false_negatives += 1,
				_ => {}
			}
		}
		let accuracy = accuracy.finalize().ok_or(MetricUndefinedError::Empty)?;
		let precision = ratio_or_zero(
			"precision",
			true_positives,
			true_positives + false_positives,
		);
		let recall = ratio_or_zero("recall", true_positives, true_positives + false_negatives);
		let f1 = if precision + recall > 0.0 {
			2.0 * precision * recall / (precision + recall)
		} else {
			0.0
		};
		Ok(BinaryClassificationMetricsOutput {
			roc_auc,
			average_precision,
			accuracy,
			precision,
			recall,
			f1,
		})
	}
}

/// A metric whose denominator is zero is reported as 0.0.
fn ratio_or_zero(name: &str, numerator: u64, denominator: u64) -> f32 {
	if denominator == 0 {
		tracing::warn!("{} is ill-defined because its denominator is zero, reporting 0.0", name);
		return 0.0;
	}
	match (numerator.to_f64(), denominator.to_f64()) {
		(Some(numerator), Some(denominator)) => (numerator / denominator) as f32,
		_ => 0.0,
	}
}

#[test]
fn test_binary_classification_metrics() {
	let mut metrics = BinaryClassificationMetrics::new();
	metrics.update(BinaryClassificationMetricsInput {
		labels: &[0, 0, 1],
		predictions: &[0, 1, 1],
		probabilities: &[0.1, 0.6, 0.8],
	});
	metrics.update(BinaryClassificationMetricsInput {
		labels: &[1],
		predictions: &[0],
		probabilities: &[0.3],
	});
	insta::assert_debug_snapshot!(metrics.finalize().unwrap(), @r###"
 BinaryClassificationMetricsOutput {
     roc_auc: 0.75,
     average_precision: 0.8333333,
     accuracy: 0.5,
     precision: 0.5,
     recall: 0.5,
     f1: 0.5,
 }
 "###);
}

#[test]
fn test_chunk_order_does_not_matter() {
	let chunks: Vec<(Vec<usize>, Vec<usize>, Vec<f32>)> = vec![
		(vec![0, 1], vec![0, 1], vec![0.2, 0.7]),
		(vec![1, 0, 0], vec![1, 1, 0], vec![0.9, 0.55, 0.4]),
		(vec![1], vec![0], vec![0.45]),
	];
	let compute = |order: &[usize]| {
		let mut metrics = BinaryClassificationMetrics::new();
		for index in order {
			let (labels, predictions, probabilities) = &chunks[*index];
			metrics.update(BinaryClassificationMetricsInput {
				labels,
				predictions,
				probabilities,
			});
		}
		metrics.finalize().unwrap()
	};
	assert_eq!(compute(&[0, 1, 2]), compute(&[2, 0, 1]));
}

#[test]
fn test_constant_probabilities() {
	let labels: Vec<usize> = (0..2000).map(|i| i % 2).collect();
	let probabilities = vec![0.5; 2000];
	let predictions = vec![0; 2000];
	let mut metrics = BinaryClassificationMetrics::new();
	for ((labels, predictions), probabilities) in labels
		.chunks(300)
		.zip(predictions.chunks(300))
		.zip(probabilities.chunks(300))
	{
		metrics.update(BinaryClassificationMetricsInput {
			labels,
			predictions,
			probabilities,
		});
	}
	let output = metrics.finalize().unwrap();
	assert_eq!(output.roc_auc, 0.5);
	assert_eq!(output.average_precision, 0.5);
	assert_eq!(output.accuracy, 0.5);
	assert_eq!(output.precision, 0.0);
	assert_eq!(output.recall, 0.0);
	assert_eq!(output.f1, 0.0);
}

#[test]
fn test_single_class_is_undefined() {
	let mut metrics = BinaryClassificationMetrics::new();
	metrics.update(BinaryClassificationMetricsInput {
		labels: &[0, 0, 0],
		predictions: &[0, 1, 0],
		probabilities: &[0.2, 0.8, 0.1],
	});
	assert_eq!(
		metrics.finalize(),
		Err(MetricUndefinedError::SingleClass { label: 0 })
	);
	assert_eq!(
		BinaryClassificationMetrics::new().finalize(),
		Err(MetricUndefinedError::Empty)
	);
}
