//! The Burn modules making up the two supported topologies: a shared
//! two-branch input encoder, the regression network, and the termination
//! classifier.

mod branches;
mod classifier;
mod init;
mod regression;

pub use branches::BranchEncoder;
pub use classifier::DoneNet;
pub use regression::RegressionNet;

use burn::prelude::*;
use rand::rngs::StdRng;

use crate::config::{NetworkConfig, Topology};
use crate::error::BuildError;

/// Assembled network: one of the two supported topologies.
#[derive(Module, Debug)]
pub enum Network<B: Backend> {
    Regression(RegressionNet<B>),
    Done(DoneNet<B>),
}

impl<B: Backend> Network<B> {
    /// Assemble the topology described by `config`. Fails on zero
    /// dimensions or zero hidden widths before any layer is built.
    pub fn build(
        config: &NetworkConfig,
        rng: &mut StdRng,
        device: &B::Device,
    ) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(match config.topology {
            Topology::Regression => Network::Regression(RegressionNet::new(config, rng, device)),
            Topology::DoneClassifier => Network::Done(DoneNet::new(config, rng, device)),
        })
    }

    /// Forward pass: `[batch, action_dim]` x `[batch, state_dim]` ->
    /// `[batch, output_dim]`.
    pub fn forward(&self, actions: Tensor<B, 2>, states: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            Network::Regression(net) => net.forward(actions, states),
            Network::Done(net) => net.forward(actions, states),
        }
    }

    /// Summed L2 penalties of all regularized dense kernels, added to the
    /// training loss each batch.
    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        match self {
            Network::Regression(net) => net.l2_penalty(),
            Network::Done(net) => net.l2_penalty(),
        }
    }
}
