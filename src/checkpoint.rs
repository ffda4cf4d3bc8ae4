//! Persistence for a trained network: recorded weight tensors next to the
//! JSON-serialized [`NetworkConfig`] that rebuilds the same topology.

use std::fs;
use std::path::Path;

use burn::module::AutodiffModule;
use burn::prelude::*;
use burn::record::DefaultRecorder;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::NetworkConfig;
use crate::error::CheckpointError;
use crate::net::Network;
use crate::TrainBackend;

/// Stem of the recorded weights file (the recorder appends `.mpk`).
pub const WEIGHTS_FILE: &str = "network";

/// Name of the serialized network config.
pub const CONFIG_FILE: &str = "config.json";

/// Write `config.json` and the recorded weights into `dir`, creating the
/// directory if needed.
pub fn save(
    network: &Network<TrainBackend>,
    config: &NetworkConfig,
    dir: &Path,
) -> Result<(), CheckpointError> {
    fs::create_dir_all(dir)?;

    let recorder = DefaultRecorder::default();
    network
        .clone()
        .valid()
        .save_file(dir.join(WEIGHTS_FILE), &recorder)
        .map_err(|e| CheckpointError::WeightsSave(e.to_string()))?;

    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(dir.join(CONFIG_FILE), config_json)?;
    Ok(())
}

/// Rebuild a stored network: parse and validate `config.json`, assemble a
/// fresh topology, then restore the recorded weights over it.
pub fn load(dir: &Path) -> Result<(NetworkConfig, Network<TrainBackend>), CheckpointError> {
    let config_path = dir.join(CONFIG_FILE);
    let config_json = fs::read_to_string(&config_path).map_err(|e| CheckpointError::ConfigRead {
        path: config_path.clone(),
        source: e,
    })?;
    let config: NetworkConfig =
        serde_json::from_str(&config_json).map_err(|e| CheckpointError::ConfigParse {
            path: config_path,
            source: e,
        })?;
    config.validate()?;

    let device = Default::default();
    let mut rng = StdRng::from_os_rng();
    let network = Network::<TrainBackend>::build(&config, &mut rng, &device)?;

    let recorder = DefaultRecorder::default();
    let network = network
        .load_file(dir.join(WEIGHTS_FILE), &recorder, &device)
        .map_err(|e| CheckpointError::WeightsLoad(e.to_string()))?;

    Ok((config, network))
}
