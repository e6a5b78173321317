use super::auc_roc::compute_tps_fps_by_threshold;
use num_traits::ToPrimitive;

/**
This function computes the average precision, the area under the precision recall curve summarized as the weighted mean of the precision at each threshold, weighted by the increase in recall from the previous threshold:

`AP = sum over n of (R_n - R_(n-1)) * P_n`

Labels are 0 or 1. Average precision is undefined, and `None` is returned, when there are no positive labels.
*/
pub fn average_precision(probabilities: &[f32], labels: &[usize]) -> Option<f32> {
	let count_positives = labels.iter().filter(|label| **label == 1).count();
	if count_positives == 0 {
		return None;
	}
	let count_positives = count_positives.to_f64()?;
	let mut true_positives = 0usize;
	let mut false_positives = 0usize;
	let mut previous_recall = 0.0;
	let mut average_precision = 0.0;
	for point in compute_tps_fps_by_threshold(probabilities, labels) {
		true_positives += point.true_positives;
		false_positives += point.false_positives;
		let recall = true_positives.to_f64()? / count_positives;
		let precision = true_positives.to_f64()? / (true_positives + false_positives).to_f64()?;
		average_precision += (recall - previous_recall) * precision;
		previous_recall = recall;
	}
	average_precision.to_f32()
}

#[test]
fn test_average_precision() {
	// thresholds 0.8, 0.4, 0.35, 0.1 give (recall, precision) (0.5, 1), (0.5, 0.5), (1, 2/3), (1, 0.5)
	let labels = vec![0, 0, 1, 1];
	let probabilities = vec![0.1, 0.4, 0.35, 0.8];
	let ap = average_precision(&probabilities, &labels).unwrap();
	assert!((ap - 0.833_333_3).abs() < 1e-6);
}

#[test]
fn test_average_precision_ties_and_undefined() {
	assert_eq!(average_precision(&[0.5; 4], &[1, 0, 1, 0]), Some(0.5));
	assert_eq!(average_precision(&[0.9, 0.1], &[1, 1]), Some(1.0));
	assert_eq!(average_precision(&[0.9, 0.1], &[0, 0]), None);
}
