//! # model-nets
//!
//! Two small feed-forward network wrappers for a model-based RL loop,
//! built on the Burn ML framework:
//!
//! - a two-branch **regression network** mapping an (action, state) pair to
//!   an output vector (learned dynamics / reward model), and
//! - a **termination classifier** mapping an (action, state) pair to the
//!   probability that the episode ends.
//!
//! Graph assembly is declarative; autodiff, tensor math, and the Adam
//! optimizer come from Burn. The public entry point is [`ModelFactory`].
//!
//! ## Modules
//!
//! - [`factory`] — build/train/predict/save/load for both topologies
//! - [`net`] — the Burn modules: branch encoder, regression net, done net
//! - [`config`] — network and training-binary configuration
//! - [`data`] — flat-slice reshaping, output matrices, batch plans
//! - [`loss`] — tensor-level loss functions
//! - [`metrics`] — rolling loss window, train reports, accuracy
//! - [`checkpoint`] — weight + config persistence
//! - [`error`] — structured error types

#![recursion_limit = "256"]

pub mod checkpoint;
pub mod config;
pub mod data;
pub mod error;
pub mod factory;
pub mod loss;
pub mod metrics;
pub mod net;

/// Backend used for inference (CPU; the networks are small MLPs).
pub type InferBackend = burn::backend::NdArray<f32>;

/// Backend used for training (autodiff on top of the inference backend).
pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub use config::{LossKind, MetricKind, NetworkConfig, Topology};
pub use data::Matrix;
pub use error::{BuildError, CheckpointError, ShapeError, TrainError};
pub use factory::ModelFactory;
pub use metrics::TrainReport;
