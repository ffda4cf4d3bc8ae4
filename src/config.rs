use std::path::{Path, PathBuf};

use crate::error::{BuildError, ConfigError};

/// Loss function applied to the network's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    MeanSquaredError,
    BinaryCrossEntropy,
}

/// Optional metric reported alongside the loss during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Fraction of thresholded predictions (at 0.5) matching the targets.
    Accuracy,
}

/// Which of the two supported network topologies to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Two-branch encoder, relu merge, dense/norm/relu hidden blocks,
    /// linear output head.
    Regression,
    /// Two-branch encoder, tanh merge, dense/norm/tanh-dense hidden blocks,
    /// sigmoid output head.
    DoneClassifier,
}

/// Immutable description of a two-branch network. Created once, owned by
/// the factory, never mutated afterwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NetworkConfig {
    pub topology: Topology,
    pub action_dim: usize,
    pub state_dim: usize,
    pub output_dim: usize,
    /// Widths of the hidden blocks after the merge layer. May be empty.
    pub hidden_layers: Vec<usize>,
    pub loss: LossKind,
    pub metric: Option<MetricKind>,
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Emit per-epoch progress at info level instead of debug.
    pub verbose: bool,
}

impl NetworkConfig {
    /// Config for the regression topology: MSE loss, no metric, large
    /// silent batches.
    pub fn regression(
        hidden_layers: Vec<usize>,
        action_dim: usize,
        state_dim: usize,
        output_dim: usize,
    ) -> Self {
        NetworkConfig {
            topology: Topology::Regression,
            action_dim,
            state_dim,
            output_dim,
            hidden_layers,
            loss: LossKind::MeanSquaredError,
            metric: None,
            learning_rate: 1e-3,
            batch_size: 1024,
            verbose: false,
        }
    }

    /// Config for the termination classifier: binary cross-entropy,
    /// accuracy metric, smaller batches with per-epoch reporting.
    pub fn done_classifier(
        hidden_layers: Vec<usize>,
        action_dim: usize,
        state_dim: usize,
        output_dim: usize,
    ) -> Self {
        NetworkConfig {
            topology: Topology::DoneClassifier,
            action_dim,
            state_dim,
            output_dim,
            hidden_layers,
            loss: LossKind::BinaryCrossEntropy,
            metric: Some(MetricKind::Accuracy),
            learning_rate: 1e-3,
            batch_size: 256,
            verbose: true,
        }
    }

    /// Override the loss function.
    pub fn with_loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }

    /// Override the reported metric.
    pub fn with_metric(mut self, metric: Option<MetricKind>) -> Self {
        self.metric = metric;
        self
    }

    /// Validate dimensions and hyperparameters.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.action_dim == 0 {
            return Err(BuildError::ZeroDim { field: "action_dim" });
        }
        if self.state_dim == 0 {
            return Err(BuildError::ZeroDim { field: "state_dim" });
        }
        if self.output_dim == 0 {
            return Err(BuildError::ZeroDim { field: "output_dim" });
        }
        if let Some(index) = self.hidden_layers.iter().position(|&w| w == 0) {
            return Err(BuildError::ZeroWidth { index });
        }
        if self.batch_size == 0 {
            return Err(BuildError::ZeroBatchSize);
        }
        if self.learning_rate <= 0.0 {
            return Err(BuildError::InvalidLearningRate(self.learning_rate));
        }
        Ok(())
    }
}

/// Configuration for the synthetic-data training binary, loadable from TOML.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Number of synthetic transitions to generate.
    pub samples: usize,
    /// Fraction of samples held out for evaluation.
    pub holdout: f64,
    pub epochs: usize,
    pub action_dim: usize,
    pub state_dim: usize,
    /// Hidden widths for the regression network.
    pub hidden_layers: Vec<usize>,
    /// Hidden widths for the termination classifier.
    pub done_hidden_layers: Vec<usize>,
    pub checkpoint_dir: PathBuf,
    pub seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            samples: 4096,
            holdout: 0.2,
            epochs: 30,
            action_dim: 4,
            state_dim: 8,
            hidden_layers: vec![64, 64],
            done_hidden_layers: vec![32],
            checkpoint_dir: PathBuf::from("checkpoints"),
            seed: 7,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            eprintln!(
                "Warning: config file '{}' not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 {
            return Err(ConfigError::Validation("samples must be > 0".into()));
        }
        if self.epochs == 0 {
            return Err(ConfigError::Validation("epochs must be > 0".into()));
        }
        if self.action_dim == 0 || self.state_dim == 0 {
            return Err(ConfigError::Validation(
                "action_dim and state_dim must be > 0".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.holdout) {
            return Err(ConfigError::Validation(
                "holdout must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_defaults() {
        let config = NetworkConfig::regression(vec![64, 64], 3, 5, 1);
        assert_eq!(config.topology, Topology::Regression);
        assert_eq!(config.loss, LossKind::MeanSquaredError);
        assert_eq!(config.metric, None);
        assert_eq!(config.batch_size, 1024);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_done_classifier_defaults() {
        let config = NetworkConfig::done_classifier(vec![32], 2, 2, 1);
        assert_eq!(config.topology, Topology::DoneClassifier);
        assert_eq!(config.loss, LossKind::BinaryCrossEntropy);
        assert_eq!(config.metric, Some(MetricKind::Accuracy));
        assert_eq!(config.batch_size, 256);
        assert!(config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_hidden_layers_is_valid() {
        let config = NetworkConfig::regression(vec![], 3, 5, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dims_rejected() {
        let config = NetworkConfig::regression(vec![64], 0, 5, 1);
        assert!(matches!(
            config.validate(),
            Err(BuildError::ZeroDim { field: "action_dim" })
        ));

        let config = NetworkConfig::regression(vec![64], 3, 5, 0);
        assert!(matches!(
            config.validate(),
            Err(BuildError::ZeroDim { field: "output_dim" })
        ));
    }

    #[test]
    fn test_zero_hidden_width_rejected() {
        let config = NetworkConfig::regression(vec![64, 0, 32], 3, 5, 1);
        assert!(matches!(
            config.validate(),
            Err(BuildError::ZeroWidth { index: 1 })
        ));
    }

    #[test]
    fn test_network_config_json_roundtrip() {
        let config = NetworkConfig::done_classifier(vec![32, 16], 2, 4, 1);
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: NetworkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.topology, Topology::DoneClassifier);
        assert_eq!(restored.hidden_layers, vec![32, 16]);
        assert_eq!(restored.loss, LossKind::BinaryCrossEntropy);
        assert_eq!(restored.batch_size, 256);
    }

    #[test]
    fn test_app_config_toml_roundtrip() {
        let config = AppConfig::default();
        let text = toml::to_string(&config).unwrap();
        let restored: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(restored.samples, config.samples);
        assert_eq!(restored.hidden_layers, config.hidden_layers);
    }

    #[test]
    fn test_app_config_validation() {
        let config = AppConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
