//! The factory: builds a two-branch network from a [`NetworkConfig`],
//! compiles it against Burn's Adam optimizer, and exposes thin
//! train/predict wrappers over caller-supplied flat data.

use std::path::Path;

use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::checkpoint;
use crate::config::NetworkConfig;
use crate::data::{self, Matrix};
use crate::error::{BuildError, CheckpointError, ShapeError, TrainError};
use crate::metrics::{TrainReport, TrainingMetrics};
use crate::net::Network;
use crate::TrainBackend;

/// Owns one assembled network and its optimizer. Input data is supplied as
/// flat row-major slices and normalized to `[rows, dim]` per call.
pub struct ModelFactory {
    config: NetworkConfig,
    network: Network<TrainBackend>,
    optimizer: OptimizerAdaptor<Adam, Network<TrainBackend>, TrainBackend>,
    device: <TrainBackend as Backend>::Device,
    rng: StdRng,
}

impl std::fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFactory")
            .field("config", &self.config)
            .field("device", &self.device)
            .field("rng", &self.rng)
            .finish_non_exhaustive()
    }
}

impl ModelFactory {
    /// Build and compile the network described by `config`.
    pub fn from_config(config: NetworkConfig) -> Result<Self, BuildError> {
        config.validate()?;
        let device = Default::default();
        let mut rng = StdRng::from_os_rng();
        let network = Network::build(&config, &mut rng, &device)?;
        let optimizer = AdamConfig::new().init();
        Ok(ModelFactory {
            config,
            network,
            optimizer,
            device,
            rng,
        })
    }

    /// Regression network: MSE loss, linear output, batch size 1024,
    /// silent training.
    pub fn regression(
        hidden_layers: Vec<usize>,
        action_dim: usize,
        state_dim: usize,
        output_dim: usize,
    ) -> Result<Self, BuildError> {
        Self::from_config(NetworkConfig::regression(
            hidden_layers,
            action_dim,
            state_dim,
            output_dim,
        ))
    }

    /// Termination classifier: binary cross-entropy, sigmoid output,
    /// batch size 256, per-epoch progress reporting.
    pub fn done_classifier(
        hidden_layers: Vec<usize>,
        action_dim: usize,
        state_dim: usize,
        output_dim: usize,
    ) -> Result<Self, BuildError> {
        Self::from_config(NetworkConfig::done_classifier(
            hidden_layers,
            action_dim,
            state_dim,
            output_dim,
        ))
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Run `epochs` passes of shuffled mini-batch gradient descent over the
    /// supplied transitions. All three slices are reshaped to `[rows, dim]`
    /// against their declared dimensions and must agree on the row count.
    ///
    /// Updates the network parameters in place. A non-finite batch loss
    /// aborts the run.
    pub fn train(
        &mut self,
        state_data: &[f32],
        action_data: &[f32],
        target_data: &[f32],
        epochs: usize,
    ) -> Result<TrainReport, TrainError> {
        let rows = data::row_count("action", action_data, self.config.action_dim)?;
        let state_rows = data::row_count("state", state_data, self.config.state_dim)?;
        if state_rows != rows {
            return Err(ShapeError::RowMismatch {
                name: "state",
                rows: state_rows,
                expected: rows,
            }
            .into());
        }
        let target_rows = data::row_count("target", target_data, self.config.output_dim)?;
        if target_rows != rows {
            return Err(ShapeError::RowMismatch {
                name: "target",
                rows: target_rows,
                expected: rows,
            }
            .into());
        }
        if rows == 0 {
            return Err(TrainError::NoSamples);
        }

        let mut metrics = TrainingMetrics::new();
        let mut batches_run = 0;
        let mut last_metric = None;

        for epoch in 1..=epochs {
            let plan = data::shuffled_batches(rows, self.config.batch_size, &mut self.rng);
            let mut metric_weighted = 0.0f32;
            let mut metric_rows = 0usize;

            for (batch, batch_rows) in plan.iter().enumerate() {
                let actions = data::matrix::<TrainBackend>(
                    &data::gather_rows(action_data, self.config.action_dim, batch_rows),
                    self.config.action_dim,
                    &self.device,
                );
                let states = data::matrix::<TrainBackend>(
                    &data::gather_rows(state_data, self.config.state_dim, batch_rows),
                    self.config.state_dim,
                    &self.device,
                );
                let batch_targets =
                    data::gather_rows(target_data, self.config.output_dim, batch_rows);
                let targets = data::matrix::<TrainBackend>(
                    &batch_targets,
                    self.config.output_dim,
                    &self.device,
                );

                let predictions = self.network.forward(actions, states);

                if let Some(metric) = self.config.metric {
                    let predicted: Vec<f32> = predictions
                        .clone()
                        .into_data()
                        .to_vec()
                        .expect("f32 tensor data extraction");
                    metric_weighted +=
                        metric.evaluate(&predicted, &batch_targets) * batch_rows.len() as f32;
                    metric_rows += batch_rows.len();
                }

                let loss =
                    self.config.loss.forward(predictions, targets) + self.network.l2_penalty();
                let loss_value: f32 = loss
                    .clone()
                    .into_data()
                    .to_vec::<f32>()
                    .expect("f32 loss tensor extraction")[0];
                if !loss_value.is_finite() {
                    return Err(TrainError::NonFiniteLoss {
                        epoch,
                        batch,
                        loss: loss_value,
                    });
                }

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &self.network);
                self.network =
                    self.optimizer
                        .step(self.config.learning_rate, self.network.clone(), grads);

                metrics.record_loss(loss_value);
                batches_run += 1;
            }

            last_metric = (metric_rows > 0).then(|| metric_weighted / metric_rows as f32);
            self.log_epoch(epoch, epochs, metrics.average_loss(plan.len()), last_metric);
        }

        Ok(TrainReport {
            epochs,
            batches: batches_run,
            final_loss: metrics.last_loss(),
            metric: last_metric,
        })
    }

    /// Forward pass over the supplied rows on the inference backend.
    /// Returns a `[rows, output_dim]` matrix; does not touch parameters.
    pub fn predict(&self, state_data: &[f32], action_data: &[f32]) -> Result<Matrix, ShapeError> {
        let rows = data::row_count("action", action_data, self.config.action_dim)?;
        let state_rows = data::row_count("state", state_data, self.config.state_dim)?;
        if state_rows != rows {
            return Err(ShapeError::RowMismatch {
                name: "state",
                rows: state_rows,
                expected: rows,
            });
        }
        if rows == 0 {
            return Ok(Matrix::new(Vec::new(), 0, self.config.output_dim));
        }

        let network = self.network.valid();
        let actions = data::matrix(action_data, self.config.action_dim, &self.device);
        let states = data::matrix(state_data, self.config.state_dim, &self.device);
        Ok(Matrix::from_tensor(network.forward(actions, states)))
    }

    /// Persist the network weights and config under `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), CheckpointError> {
        checkpoint::save(&self.network, &self.config, dir)
    }

    /// Restore a factory from [`save`](Self::save) output. Optimizer state
    /// is not persisted; training resumes with fresh Adam moments.
    pub fn load(dir: &Path) -> Result<Self, CheckpointError> {
        let (config, network) = checkpoint::load(dir)?;
        Ok(ModelFactory {
            config,
            network,
            optimizer: AdamConfig::new().init(),
            device: Default::default(),
            rng: StdRng::from_os_rng(),
        })
    }

    fn log_epoch(&self, epoch: usize, epochs: usize, loss: f32, metric: Option<f32>) {
        let loss = f64::from(loss);
        match (self.config.verbose, metric) {
            (true, Some(m)) => {
                tracing::info!(epoch, epochs, loss, metric = f64::from(m), "epoch complete")
            }
            (true, None) => tracing::info!(epoch, epochs, loss, "epoch complete"),
            (false, Some(m)) => {
                tracing::debug!(epoch, epochs, loss, metric = f64::from(m), "epoch complete")
            }
            (false, None) => tracing::debug!(epoch, epochs, loss, "epoch complete"),
        }
    }
}
