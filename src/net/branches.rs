use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;
use rand::rngs::StdRng;

use super::init::orthogonal_linear;

/// Width of each input branch.
pub(crate) const BRANCH_WIDTH: usize = 32;

/// Width of the merged representation (both branch outputs concatenated).
pub(crate) const MERGE_WIDTH: usize = 2 * BRANCH_WIDTH;

/// L2 penalty coefficient applied to the regularized dense kernels.
pub(crate) const WEIGHT_DECAY: f64 = 0.01;

/// L2 penalty of one dense kernel: `0.01 * sum(w^2)`.
pub(crate) fn kernel_penalty<B: Backend>(linear: &Linear<B>) -> Tensor<B, 1> {
    let w = linear.weight.val();
    (w.clone() * w).sum().mul_scalar(WEIGHT_DECAY)
}

/// Two-branch input encoder shared by both topologies.
///
/// ```text
/// actions [batch, action_dim] -> dense(32, relu) -> batch norm -> relu
/// states  [batch, state_dim]  -> dense(32, relu, orthogonal, L2) -> batch norm
/// output: concat(actions, states) => [batch, 64]
/// ```
///
/// The action branch applies relu a second time after the norm, on top of
/// the already-activated dense output. The state branch is the only
/// regularized layer in the encoder.
#[derive(Module, Debug)]
pub struct BranchEncoder<B: Backend> {
    action_dense: Linear<B>,
    action_norm: BatchNorm<B, 0>,
    state_dense: Linear<B>,
    state_norm: BatchNorm<B, 0>,
    relu: Relu,
}

impl<B: Backend> BranchEncoder<B> {
    pub fn new(
        action_dim: usize,
        state_dim: usize,
        rng: &mut StdRng,
        device: &B::Device,
    ) -> Self {
        BranchEncoder {
            action_dense: LinearConfig::new(action_dim, BRANCH_WIDTH).init(device),
            action_norm: BatchNormConfig::new(BRANCH_WIDTH).init(device),
            state_dense: orthogonal_linear(state_dim, BRANCH_WIDTH, rng, device),
            state_norm: BatchNormConfig::new(BRANCH_WIDTH).init(device),
            relu: Relu::new(),
        }
    }

    /// Forward pass: `[batch, action_dim]` x `[batch, state_dim]` ->
    /// `[batch, 64]`. Action features come first in the concatenation.
    pub fn forward(&self, actions: Tensor<B, 2>, states: Tensor<B, 2>) -> Tensor<B, 2> {
        let a = self.relu.forward(self.action_dense.forward(actions));
        let a = self.action_norm.forward(a);
        let a = self.relu.forward(a);

        let s = self.relu.forward(self.state_dense.forward(states));
        let s = self.state_norm.forward(s);

        Tensor::cat(vec![a, s], 1)
    }

    /// L2 penalty of the regularized state-branch kernel.
    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        kernel_penalty(&self.state_dense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InferBackend;
    use burn::tensor::Distribution;
    use rand::SeedableRng;

    #[test]
    fn test_encoder_output_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        let device = Default::default();
        let encoder = BranchEncoder::<InferBackend>::new(3, 5, &mut rng, &device);

        let actions = Tensor::random([4, 3], Distribution::Default, &device);
        let states = Tensor::random([4, 5], Distribution::Default, &device);
        let merged = encoder.forward(actions, states);
        assert_eq!(merged.dims(), [4, MERGE_WIDTH]);
    }

    #[test]
    fn test_action_branch_output_is_nonnegative() {
        // Both relu applications leave the action half of the merge >= 0.
        let mut rng = StdRng::seed_from_u64(1);
        let device = Default::default();
        let encoder = BranchEncoder::<InferBackend>::new(3, 5, &mut rng, &device);

        let actions = Tensor::random([8, 3], Distribution::Uniform(-1.0, 1.0), &device);
        let states = Tensor::random([8, 5], Distribution::Uniform(-1.0, 1.0), &device);
        let merged = encoder.forward(actions, states);
        let data: Vec<f32> = merged.into_data().to_vec().unwrap();

        for row in 0..8 {
            for col in 0..BRANCH_WIDTH {
                let v = data[row * MERGE_WIDTH + col];
                assert!(v >= 0.0, "action feature [{row}, {col}] = {v}");
            }
        }
    }

    #[test]
    fn test_encoder_l2_penalty_is_positive() {
        let mut rng = StdRng::seed_from_u64(2);
        let device = Default::default();
        let encoder = BranchEncoder::<InferBackend>::new(3, 5, &mut rng, &device);
        let penalty: Vec<f32> = encoder.l2_penalty().into_data().to_vec().unwrap();
        assert_eq!(penalty.len(), 1);
        assert!(penalty[0] > 0.0);
    }
}
