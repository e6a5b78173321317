use num_traits::ToPrimitive;
use std::cmp::Ordering;

/// This function computes the area under the receiver operating characteristic curve using the trapezoid method. Labels are 0 or 1. The area is undefined, and `None` is returned, unless both classes are present.
pub fn auc_roc(probabilities: &[f32], labels: &[usize]) -> Option<f32> {
	let roc_curve = compute_roc_curve(probabilities, labels)?;
	Some(
		roc_curve
			.windows(2)
			.map(|points| {
				let left = &points[0];
				let right = &points[1];
				let y_average = (left.true_positive_rate + right.true_positive_rate) / 2.0;
				let dx = right.false_positive_rate - left.false_positive_rate;
				y_average * dx
			})
			.sum(),
	)
}

#[derive(Debug, PartialEq)]
pub struct ROCCurvePoint {
	/// The classification threshold.
	pub threshold: f32,
	/// The true positive rate for all predictions with probability >= threshold.
	pub true_positive_rate: f32,
	/// The false positive rate for all predictions with probability >= threshold.
	pub false_positive_rate: f32,
}

/// This function computes the ROC curve, which plots the false positive rate on the x axis and the true positive rate on the y axis for each distinct probability used as a classification threshold.
pub fn compute_roc_curve(probabilities: &[f32], labels: &[usize]) -> Option<Vec<ROCCurvePoint>> {
	let mut tps_fps = compute_tps_fps_by_threshold(probabilities, labels);
	for i in 1..tps_fps.len() {
		tps_fps[i].true_positives += tps_fps[i - 1].true_positives;
		tps_fps[i].false_positives += tps_fps[i - 1].false_positives;
	}
	let count_positives = labels.iter().filter(|label| **label == 1).count();
	let count_negatives = labels.len() - count_positives;
	if count_positives == 0 || count_negatives == 0 {
		return None;
	}
	let count_positives = count_positives.to_f32()?;
	let count_negatives = count_negatives.to_f32()?;
	// add a point at (0,0) on the roc curve with a dummy threshold of 1.0
	let mut roc_curve = vec![ROCCurvePoint {
		threshold: 1.0,
		true_positive_rate: 0.0,
		false_positive_rate: 0.0,
	}];
	for point in tps_fps.iter() {
		roc_curve.push(ROCCurvePoint {
			threshold: point.threshold,
			true_positive_rate: point.true_positives.to_f32()? / count_positives,
			false_positive_rate: point.false_positives.to_f32()? / count_negatives,
		})
	}
	Some(roc_curve)
}

#[derive(Debug)]
pub(crate) struct TpsFpsPoint {
	/// The classification threshold.
	pub threshold: f32,
	/// The true positives for this threshold.
	pub true_positives: usize,
	/// The false positives for this threshold.
	pub false_positives: usize,
}

/**
This function computes the counts of true positives and false positives at each distinct probability, from the highest probability to the lowest. Unlike the roc curve, each point contains just the count of true positives and false positives at this threshold instead of all values greater than or equal to this threshold. Examples with equal probabilities share a point.
*/
pub(crate) fn compute_tps_fps_by_threshold(
	probabilities: &[f32],
	labels: &[usize],
) -> Vec<TpsFpsPoint> {
	let mut probabilities_labels: Vec<(f32, usize)> = probabilities
		.iter()
		.copied()
		.zip(labels.iter().copied())
		.collect();
	probabilities_labels.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
	let mut tps_fps: Vec<TpsFpsPoint> = Vec::new();
	for (probability, label) in probabilities_labels {
		let tp = if label == 1 { 1 } else { 0 };
		match tps_fps.last_mut() {
			// if probability is same as the last one, add to the previous bucket
			Some(last) if probability.partial_cmp(&last.threshold) == Some(Ordering::Equal) => {
				last.true_positives += tp;
				last.false_positives += 1 - tp;
			}
			_ => {
				tps_fps.push(TpsFpsPoint {
					threshold: probability,
					true_positives: tp,
					false_positives: 1 - tp,
				});
			}
		}
	}
	tps_fps
}

#[test]
fn test_roc_curve() {
	let labels = vec![1, 1, 0, 0];
	let probabilities = vec![0.9, 0.4, 0.4, 0.2];
	let left = compute_roc_curve(probabilities.as_slice(), labels.as_slice()).unwrap();
	let right = vec![
		ROCCurvePoint {
			threshold: 1.0,
			true_positive_rate: 0.0,
			false_positive_rate: 0.0,
		},
		ROCCurvePoint {
			threshold: 0.9,
			true_positive_rate: 0.5,
			false_positive_rate: 0.0,
		},
		ROCCurvePoint {
			threshold: 0.4,
			true_positive_rate: 1.0,
			false_positive_rate: 0.5,
		},
		ROCCurvePoint {
			threshold: 0.2,
			true_positive_rate: 1.0,
			false_positive_rate: 1.0,
		},
	];
	assert_eq!(left, right);
	let auc = auc_roc(probabilities.as_slice(), labels.as_slice()).unwrap();
	assert!(f32::abs(auc - 0.875) < f32::EPSILON)
}

#[test]
fn test_auc_roc_constant_probabilities() {
	let labels = vec![0, 1, 0, 1, 1];
	let probabilities = vec![0.5; 5];
	assert_eq!(auc_roc(&probabilities, &labels), Some(0.5));
}

#[test]
fn test_auc_roc_single_class() {
	assert_eq!(auc_roc(&[0.1, 0.7], &[0, 0]), None);
	assert_eq!(auc_roc(&[], &[]), None);
}
