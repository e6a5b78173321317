use crate::{CsrMatrix, Error};
use ndarray::prelude::*;
use upvote_dataframe::DataFrame;

/**
A `FeatureMatrix` holds the features for one chunk of examples. Dense features come from number columns, sparse features come from a text vectorizer, and a stacked matrix places the dense columns in front of the sparse ones, as if the two had been concatenated horizontally.
*/
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureMatrix {
	Dense(Array2<f32>),
	Sparse(CsrMatrix),
	Stacked { dense: Array2<f32>, sparse: CsrMatrix },
}

impl FeatureMatrix {
	/// `dense` and `sparse` must have the same number of rows.
	pub fn stack(dense: Array2<f32>, sparse: CsrMatrix) -> Self {
		debug_assert_eq!(dense.nrows(), sparse.nrows());
		FeatureMatrix::Stacked { dense, sparse }
	}

	pub fn nrows(&self) -> usize {
		match self {
			FeatureMatrix::Dense(dense) => dense.nrows(),
			FeatureMatrix::Sparse(sparse) => sparse.nrows(),
			FeatureMatrix::Stacked { dense, .. } => dense.nrows(),
		}
	}

	pub fn ncols(&self) -> usize {
		match self {
			FeatureMatrix::Dense(dense) => dense.ncols(),
			FeatureMatrix::Sparse(sparse) => sparse.ncols(),
			FeatureMatrix::Stacked { dense, sparse } => dense.ncols() + sparse.ncols(),
		}
	}

	/// Compute the dot product of row `row` with `weights`.
	pub fn dot_row(&self, row: usize, weights: ArrayView1<f32>) -> f32 {
		match self {
			FeatureMatrix::Dense(dense) => dense.row(row).dot(&weights),
			FeatureMatrix::Sparse(sparse) => sparse_dot(sparse, row, weights),
			FeatureMatrix::Stacked { dense, sparse } => {
				let (dense_weights, sparse_weights) = weights.split_at(Axis(0), dense.ncols());
				dense.row(row).dot(&dense_weights) + sparse_dot(sparse, row, sparse_weights)
			}
		}
	}

	/// Add `scale` times row `row` to `target`.
	pub fn scaled_add_row(&self, row: usize, scale: f32, target: ArrayViewMut1<f32>) {
		match self {
			FeatureMatrix::Dense(dense) => dense_scaled_add(dense, row, scale, target),
			FeatureMatrix::Sparse(sparse) => sparse_scaled_add(sparse, row, scale, target),
			FeatureMatrix::Stacked { dense, sparse } => {
				let (dense_target, sparse_target) = target.split_at(Axis(0), dense.ncols());
				dense_scaled_add(dense, row, scale, dense_target);
				sparse_scaled_add(sparse, row, scale, sparse_target);
			}
		}
	}
}

fn sparse_dot(sparse: &CsrMatrix, row: usize, weights: ArrayView1<f32>) -> f32 {
	let (indices, values) = sparse.row(row);
	indices
		.iter()
		.zip(values.iter())
		.map(|(index, value)| weights[*index] * value)
		.sum()
}

fn dense_scaled_add(dense: &Array2<f32>, row: usize, scale: f32, mut target: ArrayViewMut1<f32>) {
	target.scaled_add(scale, &dense.row(row));
}

fn sparse_scaled_add(sparse: &CsrMatrix, row: usize, scale: f32, mut target: ArrayViewMut1<f32>) {
	let (indices, values) = sparse.row(row);
	for (index, value) in indices.iter().zip(values.iter()) {
		target[*index] += scale * value;
	}
}

/// Gather the named number columns of `dataframe` into a dense `(nrows, column_names.len())` array. Every value must be finite.
pub fn dense_features(dataframe: &DataFrame, column_names: &[&str]) -> Result<Array2<f32>, Error> {
	let mut features = Array2::zeros((dataframe.nrows(), column_names.len()));
	for (column_index, column_name) in column_names.iter().enumerate() {
		let column = dataframe.number_column(column_name)?;
		for (row, (feature, value)) in features
			.column_mut(column_index)
			.iter_mut()
			.zip(column.data.iter())
			.enumerate()
		{
			if !value.is_finite() {
				return Err(Error::NonFiniteValue {
					column: (*column_name).to_owned(),
					row: dataframe.index[row],
				});
			}
			*feature = *value;
		}
	}
	Ok(features)
}

#[cfg(test)]
fn test_sparse() -> CsrMatrix {
	let mut sparse = CsrMatrix::new(3);
	sparse.push_row(vec![(1, 2.0)]);
	sparse.push_row(vec![(0, 1.0), (2, 3.0)]);
	sparse
}

#[test]
fn test_stacked_matches_dense_concatenation() {
	let dense = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
	let sparse = test_sparse();
	let concatenated = arr2(&[[1.0, 2.0, 0.0, 2.0, 0.0], [3.0, 4.0, 1.0, 0.0, 3.0]]);
	let stacked = FeatureMatrix::stack(dense, sparse);
	let reference = FeatureMatrix::Dense(concatenated);
	assert_eq!(stacked.ncols(), 5);
	let weights = arr1(&[0.5, -1.0, 2.0, 0.25, 1.0]);
	for row in 0..2 {
		let stacked_dot = stacked.dot_row(row, weights.view());
		let reference_dot = reference.dot_row(row, weights.view());
		assert!((stacked_dot - reference_dot).abs() < 1e-6);
		let mut a = Array1::zeros(5);
		let mut b = Array1::zeros(5);
		stacked.scaled_add_row(row, 2.0, a.view_mut());
		reference.scaled_add_row(row, 2.0, b.view_mut());
		assert_eq!(a, b);
	}
}

#[test]
fn test_dense_features_rejects_missing_values() {
	use upvote_dataframe::{Column, NumberColumn};
	let dataframe = DataFrame::new(
		vec![7, 8],
		vec![
			Column::Number(NumberColumn::new("a".to_owned(), vec![1.0, 2.0])),
			Column::Number(NumberColumn::new("b".to_owned(), vec![3.0, std::f32::NAN])),
		],
	);
	let features = dense_features(&dataframe, &["b", "a"]);
	assert!(matches!(features, Err(Error::NonFiniteValue { row: 8, .. })));
	let features = dense_features(&dataframe, &["a"]).unwrap();
	assert_eq!(features, arr2(&[[1.0], [2.0]]));
	assert!(matches!(
		dense_features(&dataframe, &["c"]),
		Err(Error::Column(_))
	));
}

#[cfg(debug_assertions)]
#[test]
#[should_panic]
fn test_stack_rejects_different_row_counts() {
	FeatureMatrix::stack(Array2::zeros((3, 2)), test_sparse());
}
