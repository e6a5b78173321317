use ndarray::prelude::*;

/**
A `CsrMatrix` is a sparse matrix in compressed sparse row format. Row `i` owns the entries `indptr[i]..indptr[i + 1]` of `indices` and `values`, and within a row the column indices are strictly increasing.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix {
	ncols: usize,
	indptr: Vec<usize>,
	indices: Vec<usize>,
	values: Vec<f32>,
}

impl CsrMatrix {
	/// Create a matrix with `ncols` columns and no rows.
	pub fn new(ncols: usize) -> Self {
		Self {
			ncols,
			indptr: vec![0],
			indices: Vec::new(),
			values: Vec::new(),
		}
	}

	/// Append a row. `entries` must be sorted by column index with no duplicates.
	pub fn push_row(&mut self, entries: impl IntoIterator<Item = (usize, f32)>) {
		let row_start = self.indices.len();
		for (index, value) in entries {
			debug_assert!(index < self.ncols);
			debug_assert!(
				self.indices.len() == row_start || self.indices[self.indices.len() - 1] < index
			);
			self.indices.push(index);
			self.values.push(value);
		}
		self.indptr.push(self.indices.len());
	}

	pub fn nrows(&self) -> usize {
		self.indptr.len() - 1
	}

	pub fn ncols(&self) -> usize {
		self.ncols
	}

	/// The number of stored entries.
	pub fn nnz(&self) -> usize {
		self.values.len()
	}

	pub fn row(&self, row: usize) -> (&[usize], &[f32]) {
		let range = self.indptr[row]..self.indptr[row + 1];
		(&self.indices[range.clone()], &self.values[range])
	}

	pub fn to_dense(&self) -> Array2<f32> {
		let mut dense = Array2::zeros((self.nrows(), self.ncols));
		for row in 0..self.nrows() {
			let (indices, values) = self.row(row);
			for (index, value) in indices.iter().zip(values.iter()) {
				dense[(row, *index)] = *value;
			}
		}
		dense
	}
}

#[test]
fn test_csr_matrix() {
	let mut matrix = CsrMatrix::new(4);
	matrix.push_row(vec![(0, 1.0), (3, 2.0)]);
	matrix.push_row(vec![]);
	matrix.push_row(vec![(2, 5.0)]);
	assert_eq!(matrix.nrows(), 3);
	assert_eq!(matrix.nnz(), 3);
	assert_eq!(matrix.row(1), (&[][..], &[][..]));
	assert_eq!(
		matrix.to_dense(),
		arr2(&[[1.0, 0.0, 0.0, 2.0], [0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 5.0, 0.0]])
	);
}
