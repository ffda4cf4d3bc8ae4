use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig, Sigmoid, Tanh};
use burn::prelude::*;
use rand::rngs::StdRng;

use super::branches::{kernel_penalty, BranchEncoder, MERGE_WIDTH};
use super::init::orthogonal_linear;
use crate::config::NetworkConfig;

/// Hidden block: unactivated dense -> batch norm -> tanh-activated dense
/// of the same width. The second dense layer's tanh takes the place of a
/// post-norm activation.
#[derive(Module, Debug)]
pub struct DoneBlock<B: Backend> {
    dense: Linear<B>,
    norm: BatchNorm<B, 0>,
    out_dense: Linear<B>,
    tanh: Tanh,
}

impl<B: Backend> DoneBlock<B> {
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.norm.forward(self.dense.forward(x));
        self.tanh.forward(self.out_dense.forward(x))
    }
}

/// Termination-classifier topology: two-branch encoder, tanh merge layer,
/// a stack of dense/norm/tanh-dense blocks, and a sigmoid output head.
///
/// ```text
/// encoder                  => [batch, 64]
/// dense(64, tanh, orth/L2) => [batch, 64]
/// per hidden width w:
///   dense(w, orth/L2) -> batch norm -> dense(w, tanh, orth/L2)
/// dense(output_dim, sigmoid) => [batch, output_dim] in [0, 1]
/// ```
#[derive(Module, Debug)]
pub struct DoneNet<B: Backend> {
    encoder: BranchEncoder<B>,
    merge_dense: Linear<B>,
    blocks: Vec<DoneBlock<B>>,
    head: Linear<B>,
    tanh: Tanh,
    sigmoid: Sigmoid,
}

impl<B: Backend> DoneNet<B> {
    pub fn new(config: &NetworkConfig, rng: &mut StdRng, device: &B::Device) -> Self {
        let encoder = BranchEncoder::new(config.action_dim, config.state_dim, rng, device);
        let merge_dense = orthogonal_linear(MERGE_WIDTH, MERGE_WIDTH, rng, device);

        let mut blocks = Vec::with_capacity(config.hidden_layers.len());
        let mut width = MERGE_WIDTH;
        for &w in &config.hidden_layers {
            blocks.push(DoneBlock {
                dense: orthogonal_linear(width, w, rng, device),
                norm: BatchNormConfig::new(w).init(device),
                out_dense: orthogonal_linear(w, w, rng, device),
                tanh: Tanh::new(),
            });
            width = w;
        }

        DoneNet {
            encoder,
            merge_dense,
            blocks,
            head: LinearConfig::new(width, config.output_dim).init(device),
            tanh: Tanh::new(),
            sigmoid: Sigmoid::new(),
        }
    }

    /// Forward pass: `[batch, action_dim]` x `[batch, state_dim]` ->
    /// `[batch, output_dim]` probabilities.
    pub fn forward(&self, actions: Tensor<B, 2>, states: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.encoder.forward(actions, states);
        let mut x = self.tanh.forward(self.merge_dense.forward(x));
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.sigmoid.forward(self.head.forward(x))
    }

    /// Summed L2 penalties of the regularized kernels (state branch, merge
    /// layer, both dense layers of every block). The head is not
    /// regularized.
    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        let mut penalty = self.encoder.l2_penalty() + kernel_penalty(&self.merge_dense);
        for block in &self.blocks {
            penalty = penalty + kernel_penalty(&block.dense) + kernel_penalty(&block.out_dense);
        }
        penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InferBackend;
    use burn::tensor::Distribution;
    use rand::SeedableRng;

    fn build(hidden: Vec<usize>) -> DoneNet<InferBackend> {
        let config = NetworkConfig::done_classifier(hidden, 2, 2, 1);
        let mut rng = StdRng::seed_from_u64(0);
        let device = Default::default();
        DoneNet::new(&config, &mut rng, &device)
    }

    #[test]
    fn test_forward_output_shape() {
        let net = build(vec![32]);
        let device = Default::default();
        let actions = Tensor::random([4, 2], Distribution::Default, &device);
        let states = Tensor::random([4, 2], Distribution::Default, &device);
        let out = net.forward(actions, states);
        assert_eq!(out.dims(), [4, 1]);
    }

    #[test]
    fn test_outputs_are_probabilities() {
        let net = build(vec![32, 16]);
        let device = Default::default();
        let actions = Tensor::random([16, 2], Distribution::Uniform(-5.0, 5.0), &device);
        let states = Tensor::random([16, 2], Distribution::Uniform(-5.0, 5.0), &device);
        let out: Vec<f32> = net
            .forward(actions, states)
            .into_data()
            .to_vec()
            .unwrap();
        for (i, p) in out.iter().enumerate() {
            assert!((0.0..=1.0).contains(p), "output {i} = {p} out of [0, 1]");
        }
    }

    #[test]
    fn test_empty_hidden_layers_still_builds() {
        let net = build(vec![]);
        assert!(net.blocks.is_empty());
        let device = Default::default();
        let actions = Tensor::random([2, 2], Distribution::Default, &device);
        let states = Tensor::random([2, 2], Distribution::Default, &device);
        assert_eq!(net.forward(actions, states).dims(), [2, 1]);
    }
}
