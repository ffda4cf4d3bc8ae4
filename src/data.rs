use burn::prelude::*;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::ShapeError;

/// Number of `[rows, dim]` rows the flat slice divides into, or a
/// [`ShapeError`] if the element count is not divisible by `dim`.
pub fn row_count(name: &'static str, data: &[f32], dim: usize) -> Result<usize, ShapeError> {
    if data.len() % dim != 0 {
        return Err(ShapeError::NotDivisible {
            name,
            len: data.len(),
            dim,
        });
    }
    Ok(data.len() / dim)
}

/// Build a `[rows, dim]` tensor from flat row-major data. The caller has
/// already validated divisibility via [`row_count`].
pub fn matrix<B: Backend>(data: &[f32], dim: usize, device: &B::Device) -> Tensor<B, 2> {
    let rows = data.len() / dim;
    Tensor::<B, 1>::from_data(TensorData::from(data), device).reshape([rows as i32, dim as i32])
}

/// Copy the given rows out of flat row-major data into a new flat buffer.
pub fn gather_rows(data: &[f32], dim: usize, rows: &[usize]) -> Vec<f32> {
    let mut out = Vec::with_capacity(rows.len() * dim);
    for &row in rows {
        out.extend_from_slice(&data[row * dim..(row + 1) * dim]);
    }
    out
}

/// Split `rows` indices into shuffled mini-batches of at most `batch_size`.
/// The final batch may be smaller.
pub fn shuffled_batches(rows: usize, batch_size: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..rows).collect();
    indices.shuffle(rng);
    indices.chunks(batch_size).map(|c| c.to_vec()).collect()
}

/// Row-major `[rows, cols]` output matrix returned by prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    pub fn new(data: Vec<f32>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Matrix { data, rows, cols }
    }

    /// Pull a rank-2 tensor back to the host.
    pub fn from_tensor<B: Backend>(tensor: Tensor<B, 2>) -> Self {
        let [rows, cols] = tensor.dims();
        let data = tensor
            .into_data()
            .to_vec::<f32>()
            .expect("f32 tensor data extraction");
        Matrix { data, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InferBackend;
    use rand::SeedableRng;

    #[test]
    fn test_row_count_divisible() {
        let data = vec![0.0; 12];
        assert_eq!(row_count("state", &data, 3).unwrap(), 4);
        assert_eq!(row_count("state", &data, 4).unwrap(), 3);
        assert_eq!(row_count("state", &[], 5).unwrap(), 0);
    }

    #[test]
    fn test_row_count_not_divisible() {
        let data = vec![0.0; 10];
        let err = row_count("action", &data, 3).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::NotDivisible {
                name: "action",
                len: 10,
                dim: 3
            }
        ));
    }

    #[test]
    fn test_matrix_tensor_shape() {
        let data: Vec<f32> = (0..6).map(|i| i as f32).collect();
        let device = Default::default();
        let tensor = matrix::<InferBackend>(&data, 2, &device);
        assert_eq!(tensor.dims(), [3, 2]);

        let back = Matrix::from_tensor(tensor);
        assert_eq!(back.rows(), 3);
        assert_eq!(back.cols(), 2);
        assert_eq!(back.get(2, 1), 5.0);
        assert_eq!(back.row(1), &[2.0, 3.0]);
    }

    #[test]
    fn test_gather_rows() {
        let data: Vec<f32> = (0..8).map(|i| i as f32).collect(); // 4 rows of 2
        let picked = gather_rows(&data, 2, &[3, 0]);
        assert_eq!(picked, vec![6.0, 7.0, 0.0, 1.0]);
    }

    #[test]
    fn test_shuffled_batches_cover_all_rows() {
        let mut rng = StdRng::seed_from_u64(0);
        let batches = shuffled_batches(10, 4, &mut rng);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 4);
        assert_eq!(batches[2].len(), 2);

        let mut seen: Vec<usize> = batches.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffled_batches_single_batch() {
        let mut rng = StdRng::seed_from_u64(0);
        let batches = shuffled_batches(3, 1024, &mut rng);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }
}
