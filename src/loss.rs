use burn::prelude::*;

use crate::config::LossKind;

/// Probabilities are clamped away from 0 and 1 before taking logs.
const PROB_EPSILON: f32 = 1e-7;

impl LossKind {
    /// Mean loss over the batch. `predictions` and `targets` are both
    /// `[batch, output_dim]`.
    pub fn forward<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        match self {
            LossKind::MeanSquaredError => {
                let diff = predictions - targets;
                (diff.clone() * diff).mean()
            }
            LossKind::BinaryCrossEntropy => {
                let p = predictions.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
                let one = p.ones_like();
                let log_likelihood = targets.clone() * p.clone().log()
                    + (one.clone() - targets) * (one - p).log();
                log_likelihood.mean().neg()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InferBackend;
    use burn::tensor::TensorData;

    fn tensor_2d(data: &[f32], cols: usize) -> Tensor<InferBackend, 2> {
        let rows = data.len() / cols;
        let device = Default::default();
        Tensor::<InferBackend, 1>::from_data(TensorData::from(data), &device)
            .reshape([rows as i32, cols as i32])
    }

    fn scalar(t: Tensor<InferBackend, 1>) -> f32 {
        t.into_data().to_vec::<f32>().unwrap()[0]
    }

    #[test]
    fn test_mse_zero_for_exact_predictions() {
        let pred = tensor_2d(&[1.0, -2.0, 0.5, 3.0], 2);
        let target = tensor_2d(&[1.0, -2.0, 0.5, 3.0], 2);
        let loss = scalar(LossKind::MeanSquaredError.forward(pred, target));
        assert!(loss.abs() < 1e-7);
    }

    #[test]
    fn test_mse_known_value() {
        // errors: 1, -1, 2, 0 -> mean of squares = (1 + 1 + 4 + 0) / 4 = 1.5
        let pred = tensor_2d(&[1.0, 0.0, 2.0, 0.0], 2);
        let target = tensor_2d(&[0.0, 1.0, 0.0, 0.0], 2);
        let loss = scalar(LossKind::MeanSquaredError.forward(pred, target));
        assert!((loss - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_bce_near_zero_for_confident_correct_predictions() {
        let pred = tensor_2d(&[0.999, 0.001], 1);
        let target = tensor_2d(&[1.0, 0.0], 1);
        let loss = scalar(LossKind::BinaryCrossEntropy.forward(pred, target));
        assert!(loss < 0.01, "loss {} should be near zero", loss);
    }

    #[test]
    fn test_bce_uninformative_predictions_give_ln2() {
        let pred = tensor_2d(&[0.5, 0.5, 0.5, 0.5], 1);
        let target = tensor_2d(&[1.0, 0.0, 1.0, 0.0], 1);
        let loss = scalar(LossKind::BinaryCrossEntropy.forward(pred, target));
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_bce_finite_at_saturated_predictions() {
        // Clamping keeps the log finite even for exact 0/1 outputs.
        let pred = tensor_2d(&[1.0, 0.0], 1);
        let target = tensor_2d(&[0.0, 1.0], 1);
        let loss = scalar(LossKind::BinaryCrossEntropy.forward(pred, target));
        assert!(loss.is_finite());
        assert!(loss > 1.0);
    }
}
