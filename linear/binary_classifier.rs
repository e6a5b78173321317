use super::{Error, Loss, TrainOptions};
use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use upvote_features::FeatureMatrix;

/// The classes every call to `partial_fit` must declare.
pub const CLASSES: [usize; 2] = [0, 1];

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BinaryClassifier {
	pub weights: Array1<f32>,
	pub bias: f32,
	pub loss: Loss,
	pub options: TrainOptions,
	/// the number of examples passed to `partial_fit` so far
	pub n_examples_seen: u64,
}

impl BinaryClassifier {
	pub fn new(n_features: usize, loss: Loss, options: TrainOptions) -> BinaryClassifier {
		BinaryClassifier {
			weights: Array1::zeros(n_features),
			bias: 0.0,
			loss,
			options,
			n_examples_seen: 0,
		}
	}

	pub fn n_features(&self) -> usize {
		self.weights.len()
	}

	/// Update the parameters with one pass over `features`, in batches of `n_examples_per_batch`. A chunk that contains only one of the classes is fine.
	pub fn partial_fit(
		&mut self,
		features: &FeatureMatrix,
		labels: &[usize],
		classes: &[usize],
	) -> Result<(), Error> {
		if classes != CLASSES {
			return Err(Error::InvalidClasses(classes.to_vec()));
		}
		self.check_features(features)?;
		if labels.len() != features.nrows() {
			return Err(Error::LabelCountMismatch {
				n_rows: features.nrows(),
				n_labels: labels.len(),
			});
		}
		if let Some(label) = labels.iter().find(|label| !CLASSES.contains(label)) {
			return Err(Error::InvalidLabel(*label));
		}
		if labels.is_empty() {
			return Ok(());
		}
		let n_examples_per_batch = self
			.options
			.n_examples_per_batch
			.unwrap_or_else(|| labels.len())
			.max(1);
		let mut batch_start = 0;
		while batch_start < labels.len() {
			let batch_end = (batch_start + n_examples_per_batch).min(labels.len());
			self.train_batch(features, batch_start..batch_end, &labels[batch_start..batch_end]);
			batch_start = batch_end;
		}
		self.n_examples_seen += labels.len().to_u64().unwrap_or(0);
		Ok(())
	}

	fn train_batch(
		&mut self,
		features: &FeatureMatrix,
		rows: std::ops::Range<usize>,
		labels: &[usize],
	) {
		let learning_rate = self.options.learning_rate;
		let l2_regularization = self.options.l2_regularization;
		let batch_len = labels.len().to_f32().unwrap_or(1.0);
		let mut weight_gradients = Array1::<f32>::zeros(self.weights.len());
		let mut bias_gradient = 0.0;
		for (row, label) in izip!(rows, labels) {
			let z = features.dot_row(row, self.weights.view()) + self.bias;
			let gradient = self.loss.gradient(z, *label) / batch_len;
			features.scaled_add_row(row, gradient, weight_gradients.view_mut());
			bias_gradient += gradient;
		}
		izip!(self.weights.view_mut(), weight_gradients.view()).for_each(
			|(weight, weight_gradient)| {
				*weight -= learning_rate * (weight_gradient + l2_regularization * *weight);
			},
		);
		self.bias -= learning_rate * bias_gradient;
	}

	fn check_features(&self, features: &FeatureMatrix) -> Result<(), Error> {
		if features.ncols() != self.weights.len() {
			return Err(Error::FeatureCountMismatch {
				expected: self.weights.len(),
				actual: features.ncols(),
			});
		}
		Ok(())
	}

	/// Compute the signed distance of each row from the decision boundary.
	pub fn decision_function(&self, features: &FeatureMatrix) -> Result<Array1<f32>, Error> {
		self.check_features(features)?;
		Ok((0..features.nrows())
			.map(|row| features.dot_row(row, self.weights.view()) + self.bias)
			.collect())
	}

	/// Compute the probability of the positive class for each row.
	pub fn predict_proba(&self, features: &FeatureMatrix) -> Result<Array1<f32>, Error> {
		let loss = self.loss;
		Ok(self
			.decision_function(features)?
			.mapv_into(|z| loss.probability(z)))
	}

	pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>, Error> {
		Ok(self
			.decision_function(features)?
			.iter()
			.map(|z| if *z > 0.0 { 1 } else { 0 })
			.collect())
	}
}

#[cfg(test)]
fn separable() -> (FeatureMatrix, Vec<usize>) {
	let features = arr2(&[
		[-2.0, 1.0],
		[-1.5, 0.0],
		[-1.0, 1.0],
		[1.0, 0.0],
		[1.5, 1.0],
		[2.0, 0.0],
	]);
	(FeatureMatrix::Dense(features), vec![0, 0, 0, 1, 1, 1])
}

#[test]
fn test_learns_separable_data() {
	for loss in [Loss::Log, Loss::ModifiedHuber].iter() {
		let options = TrainOptions {
			learning_rate: 0.1,
			l2_regularization: 0.0,
			n_examples_per_batch: Some(2),
		};
		let mut model = BinaryClassifier::new(2, *loss, options);
		let (features, labels) = separable();
		for _ in 0..20 {
			model.partial_fit(&features, &labels, &CLASSES).unwrap();
		}
		assert_eq!(model.predict(&features).unwrap(), labels);
		let probabilities = model.predict_proba(&features).unwrap();
		assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
		assert!(probabilities[0] < 0.5 && probabilities[5] > 0.5);
		assert_eq!(model.n_examples_seen, 120);
	}
}

#[test]
fn test_whole_chunk_is_one_step() {
	let (features, labels) = separable();
	let options = TrainOptions {
		learning_rate: 1.0,
		l2_regularization: 0.0,
		n_examples_per_batch: None,
	};
	let mut model = BinaryClassifier::new(2, Loss::Log, options);
	model.partial_fit(&features, &labels, &CLASSES).unwrap();
	// With zero weights every gradient is sigmoid(0) - y, so the step is the mean of (y - 0.5) * x.
	assert!((model.weights[0] - 0.75).abs() < 1e-6);
	assert!((model.weights[1] + 1.0 / 12.0).abs() < 1e-6);
	assert!(model.bias.abs() < 1e-6);
}

#[test]
fn test_single_class_chunk() {
	let (features, _) = separable();
	let mut model = BinaryClassifier::new(2, Loss::Log, TrainOptions::default());
	model
		.partial_fit(&features, &[1, 1, 1, 1, 1, 1], &CLASSES)
		.unwrap();
	assert!(model.bias > 0.0);
}

#[test]
fn test_partial_fit_errors() {
	let (features, labels) = separable();
	let mut model = BinaryClassifier::new(2, Loss::Log, TrainOptions::default());
	assert!(matches!(
		model.partial_fit(&features, &labels, &[0, 1, 2]),
		Err(Error::InvalidClasses(_))
	));
	assert!(matches!(
		model.partial_fit(&features, &labels[..3], &CLASSES),
		Err(Error::LabelCountMismatch { .. })
	));
	assert!(matches!(
		model.partial_fit(&features, &[0, 0, 0, 1, 1, 2], &CLASSES),
		Err(Error::InvalidLabel(2))
	));
	let mut wide = BinaryClassifier::new(3, Loss::Log, TrainOptions::default());
	assert!(matches!(
		wide.partial_fit(&features, &labels, &CLASSES),
		Err(Error::FeatureCountMismatch {
			expected: 3,
			actual: 2
		})
	));
	assert_eq!(model.n_examples_seen, 0);
}

#[test]
fn test_sparse_and_stacked_features() {
	use upvote_features::CsrMatrix;
	let mut sparse = CsrMatrix::new(3);
	sparse.push_row(vec![(0, 1.0)]);
	sparse.push_row(vec![(2, 1.0)]);
	let dense = arr2(&[[0.5], [0.5]]);
	let features = FeatureMatrix::stack(dense, sparse);
	let options = TrainOptions {
		learning_rate: 0.5,
		l2_regularization: 0.0,
		n_examples_per_batch: Some(1),
	};
	let mut model = BinaryClassifier::new(4, Loss::Log, options);
	for _ in 0..50 {
		model.partial_fit(&features, &[0, 1], &CLASSES).unwrap();
	}
	assert_eq!(model.predict(&features).unwrap(), vec![0, 1]);
	assert_eq!(model.weights[2], 0.0);
}

#[test]
fn test_serialization_round_trip() {
	let (features, labels) = separable();
	let mut model = BinaryClassifier::new(2, Loss::ModifiedHuber, TrainOptions::default());
	model.partial_fit(&features, &labels, &CLASSES).unwrap();
	let bytes = rmp_serde::to_vec_named(&model).unwrap();
	let restored: BinaryClassifier = rmp_serde::from_slice(&bytes).unwrap();
	assert_eq!(restored, model);
	assert_eq!(
		restored.decision_function(&features).unwrap(),
		model.decision_function(&features).unwrap()
	);
}
