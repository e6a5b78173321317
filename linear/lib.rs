/*!
This crate implements a linear binary classifier trained by stochastic gradient descent, one chunk of examples at a time. Each call to [`BinaryClassifier::partial_fit`](struct.BinaryClassifier.html#method.partial_fit) continues from the parameters left by the previous call, so a dataset larger than memory can be learned by streaming it through the classifier.
*/

use num_traits::ToPrimitive;
use std::ops::Neg;

mod binary_classifier;

pub use binary_classifier::{BinaryClassifier, CLASSES};

/// These are the options passed to `BinaryClassifier::new`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainOptions {
	/// This is the learning rate to use when updating the model parameters.
	pub learning_rate: f32,
	/// This is the L2 regularization value to use when updating the model parameters.
	pub l2_regularization: f32,
	/// This is the number of examples to use for each gradient step. If it is `None`, each call to `partial_fit` takes a single step over the whole chunk.
	pub n_examples_per_batch: Option<usize>,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			learning_rate: 0.01,
			l2_regularization: 0.0001,
			n_examples_per_batch: None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
	/// Logistic regression.
	#[serde(alias = "log_loss")]
	Log,
	/// A smoothed hinge loss that is quadratic near the margin and linear far from it.
	ModifiedHuber,
}

impl std::fmt::Display for Loss {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Loss::Log => write!(f, "log"),
			Loss::ModifiedHuber => write!(f, "modified_huber"),
		}
	}
}

impl Loss {
	/// The derivative of the loss with respect to the decision value `z` for an example with label `label`, which is 0 or 1.
	pub fn gradient(self, z: f32, label: usize) -> f32 {
		match self {
			Loss::Log => sigmoid(z) - label.to_f32().unwrap_or(0.0),
			Loss::ModifiedHuber => {
				let y = if label == 1 { 1.0 } else { -1.0 };
				let margin = y * z;
				if margin >= 1.0 {
					0.0
				} else if margin >= -1.0 {
					-2.0 * y * (1.0 - margin)
				} else {
					-4.0 * y
				}
			}
		}
	}

	/// Map a decision value to the probability of the positive class.
	pub fn probability(self, z: f32) -> f32 {
		match self {
			Loss::Log => sigmoid(z),
			Loss::ModifiedHuber => (z.max(-1.0).min(1.0) + 1.0) / 2.0,
		}
	}
}

fn sigmoid(z: f32) -> f32 {
	if z >= 0.0 {
		1.0 / (1.0 + z.neg().exp())
	} else {
		let e = z.exp();
		e / (1.0 + e)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("the classes must be [0, 1], got {0:?}")]
	InvalidClasses(Vec<usize>),
	#[error("label {0} is not one of the classes [0, 1]")]
	InvalidLabel(usize),
	#[error("expected {expected} features, got {actual}")]
	FeatureCountMismatch { expected: usize, actual: usize },
	#[error("got {n_labels} labels for {n_rows} rows")]
	LabelCountMismatch { n_rows: usize, n_labels: usize },
}

#[test]
fn test_gradients() {
	assert!((Loss::Log.gradient(0.0, 1) + 0.5).abs() < 1e-6);
	assert!((Loss::Log.gradient(0.0, 0) - 0.5).abs() < 1e-6);
	assert_eq!(Loss::ModifiedHuber.gradient(2.0, 1), 0.0);
	assert_eq!(Loss::ModifiedHuber.gradient(0.0, 1), -2.0);
	assert_eq!(Loss::ModifiedHuber.gradient(0.0, 0), 2.0);
	assert_eq!(Loss::ModifiedHuber.gradient(-3.0, 1), -4.0);
	assert_eq!(Loss::ModifiedHuber.probability(5.0), 1.0);
	assert_eq!(Loss::ModifiedHuber.probability(0.0), 0.5);
	assert!(sigmoid(-100.0) >= 0.0 && sigmoid(100.0) <= 1.0);
}
