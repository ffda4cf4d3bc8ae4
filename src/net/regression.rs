use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;
use rand::rngs::StdRng;

use super::branches::{kernel_penalty, BranchEncoder, MERGE_WIDTH};
use super::init::orthogonal_linear;
use crate::config::NetworkConfig;

/// Hidden block: unactivated dense -> batch norm -> relu.
#[derive(Module, Debug)]
pub struct RegressionBlock<B: Backend> {
    dense: Linear<B>,
    norm: BatchNorm<B, 0>,
    relu: Relu,
}

impl<B: Backend> RegressionBlock<B> {
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.relu.forward(self.norm.forward(self.dense.forward(x)))
    }
}

/// Regression topology: two-branch encoder, relu merge layer, a stack of
/// dense/norm/relu blocks, and a linear output head.
///
/// ```text
/// encoder                  => [batch, 64]
/// dense(64, relu, orth/L2) => [batch, 64]
/// per hidden width w:
///   dense(w, orth/L2) -> batch norm -> relu
/// dense(output_dim)        => [batch, output_dim]   (no activation)
/// ```
#[derive(Module, Debug)]
pub struct RegressionNet<B: Backend> {
    encoder: BranchEncoder<B>,
    merge_dense: Linear<B>,
    blocks: Vec<RegressionBlock<B>>,
    head: Linear<B>,
    relu: Relu,
}

impl<B: Backend> RegressionNet<B> {
    pub fn new(config: &NetworkConfig, rng: &mut StdRng, device: &B::Device) -> Self {
        let encoder = BranchEncoder::new(config.action_dim, config.state_dim, rng, device);
        let merge_dense = orthogonal_linear(MERGE_WIDTH, MERGE_WIDTH, rng, device);

        let mut blocks = Vec::with_capacity(config.hidden_layers.len());
        let mut width = MERGE_WIDTH;
        for &w in &config.hidden_layers {
            blocks.push(RegressionBlock {
                dense: orthogonal_linear(width, w, rng, device),
                norm: BatchNormConfig::new(w).init(device),
                relu: Relu::new(),
            });
            width = w;
        }

        RegressionNet {
            encoder,
            merge_dense,
            blocks,
            head: LinearConfig::new(width, config.output_dim).init(device),
            relu: Relu::new(),
        }
    }

    /// Forward pass: `[batch, action_dim]` x `[batch, state_dim]` ->
    /// `[batch, output_dim]`, unbounded regression output.
    pub fn forward(&self, actions: Tensor<B, 2>, states: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.encoder.forward(actions, states);
        let mut x = self.relu.forward(self.merge_dense.forward(x));
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.head.forward(x)
    }

    /// Summed L2 penalties of the regularized kernels (state branch, merge
    /// layer, every hidden dense). The head is not regularized.
    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        let mut penalty = self.encoder.l2_penalty() + kernel_penalty(&self.merge_dense);
        for block in &self.blocks {
            penalty = penalty + kernel_penalty(&block.dense);
        }
        penalty
    }
}
