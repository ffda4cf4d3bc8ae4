use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use model_nets::config::AppConfig;
use model_nets::{Matrix, ModelFactory};

/// Train both model networks on synthetic transition data.
#[derive(Parser)]
#[command(name = "train", about = "Train the two-branch model networks on synthetic data")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Override number of synthetic transitions
    #[arg(long)]
    samples: Option<usize>,

    /// Override the checkpoint directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Override the synthetic-dataset RNG seed
    #[arg(long)]
    seed: Option<u64>,
}

/// Synthetic transitions: reward is a smooth function of (state, action),
/// the done flag is the sign of the same latent score. Both are learnable
/// by small networks, which makes this a useful end-to-end smoke run.
struct Dataset {
    train_states: Vec<f32>,
    train_actions: Vec<f32>,
    train_rewards: Vec<f32>,
    train_dones: Vec<f32>,
    eval_states: Vec<f32>,
    eval_actions: Vec<f32>,
    eval_rewards: Vec<f32>,
    eval_dones: Vec<f32>,
}

impl Dataset {
    fn generate(config: &AppConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let state_w: Vec<f32> = (0..config.state_dim)
            .map(|_| rng.random_range(-1.0..1.0))
            .collect();
        let action_w: Vec<f32> = (0..config.action_dim)
            .map(|_| rng.random_range(-1.0..1.0))
            .collect();

        let mut states = Vec::with_capacity(config.samples * config.state_dim);
        let mut actions = Vec::with_capacity(config.samples * config.action_dim);
        let mut rewards = Vec::with_capacity(config.samples);
        let mut dones = Vec::with_capacity(config.samples);

        for _ in 0..config.samples {
            let state: Vec<f32> = (0..config.state_dim)
                .map(|_| rng.random_range(-1.0..1.0))
                .collect();
            let action: Vec<f32> = (0..config.action_dim)
                .map(|_| rng.random_range(-1.0..1.0))
                .collect();

            let score: f32 = state.iter().zip(&state_w).map(|(x, w)| x * w).sum::<f32>()
                + action.iter().zip(&action_w).map(|(x, w)| x * w).sum::<f32>();
            rewards.push(score.tanh());
            dones.push(if score > 0.0 { 1.0 } else { 0.0 });

            states.extend_from_slice(&state);
            actions.extend_from_slice(&action);
        }

        let eval_rows = ((config.samples as f64) * config.holdout) as usize;
        let train_rows = config.samples - eval_rows;

        Dataset {
            eval_states: states.split_off(train_rows * config.state_dim),
            eval_actions: actions.split_off(train_rows * config.action_dim),
            eval_rewards: rewards.split_off(train_rows),
            eval_dones: dones.split_off(train_rows),
            train_states: states,
            train_actions: actions,
            train_rewards: rewards,
            train_dones: dones,
        }
    }

    fn train_rows(&self) -> usize {
        self.train_rewards.len()
    }

    fn eval_rows(&self) -> usize {
        self.eval_rewards.len()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(epochs) = cli.epochs {
        config.epochs = epochs;
    }
    if let Some(samples) = cli.samples {
        config.samples = samples;
    }
    if let Some(dir) = cli.checkpoint_dir {
        config.checkpoint_dir = dir;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    config.validate()?;

    let dataset = Dataset::generate(&config);
    println!(
        "Generated {} transitions ({} train, {} eval) with state_dim={} action_dim={}",
        config.samples,
        dataset.train_rows(),
        dataset.eval_rows(),
        config.state_dim,
        config.action_dim,
    );

    run_regression(&config, &dataset)?;
    run_done_classifier(&config, &dataset)?;
    Ok(())
}

fn run_regression(config: &AppConfig, dataset: &Dataset) -> Result<()> {
    println!("-------------------------------------------");
    println!(
        "Training regression network {:?} for {} epochs...",
        config.hidden_layers, config.epochs
    );

    let mut factory = ModelFactory::regression(
        config.hidden_layers.clone(),
        config.action_dim,
        config.state_dim,
        1,
    )?;
    let report = factory.train(
        &dataset.train_states,
        &dataset.train_actions,
        &dataset.train_rewards,
        config.epochs,
    )?;

    let predictions = factory.predict(&dataset.eval_states, &dataset.eval_actions)?;
    let holdout_mse = mse(&predictions, &dataset.eval_rewards);
    println!(
        "Regression done | batches: {} | final loss: {:.4} | holdout mse: {:.4}",
        report.batches, report.final_loss, holdout_mse
    );

    let dir = config.checkpoint_dir.join("regression");
    factory.save(&dir)?;
    let restored = ModelFactory::load(&dir)?;
    let reloaded = restored.predict(&dataset.eval_states, &dataset.eval_actions)?;
    println!(
        "Checkpoint saved to {} | reload parity: max abs diff {:.2e}",
        dir.display(),
        max_abs_diff(&predictions, &reloaded)
    );
    Ok(())
}

fn run_done_classifier(config: &AppConfig, dataset: &Dataset) -> Result<()> {
    println!("-------------------------------------------");
    println!(
        "Training termination classifier {:?} for {} epochs...",
        config.done_hidden_layers, config.epochs
    );

    let mut factory = ModelFactory::done_classifier(
        config.done_hidden_layers.clone(),
        config.action_dim,
        config.state_dim,
        1,
    )?;
    let report = factory.train(
        &dataset.train_states,
        &dataset.train_actions,
        &dataset.train_dones,
        config.epochs,
    )?;

    let predictions = factory.predict(&dataset.eval_states, &dataset.eval_actions)?;
    let holdout_accuracy = accuracy(&predictions, &dataset.eval_dones);
    println!(
        "Classifier done | batches: {} | final loss: {:.4} | train accuracy: {} | holdout accuracy: {:.1}%",
        report.batches,
        report.final_loss,
        report
            .metric
            .map_or_else(|| "n/a".to_string(), |m| format!("{:.1}%", m * 100.0)),
        holdout_accuracy * 100.0
    );

    let dir = config.checkpoint_dir.join("done_classifier");
    factory.save(&dir)?;
    let restored = ModelFactory::load(&dir)?;
    let reloaded = restored.predict(&dataset.eval_states, &dataset.eval_actions)?;
    println!(
        "Checkpoint saved to {} | reload parity: max abs diff {:.2e}",
        dir.display(),
        max_abs_diff(&predictions, &reloaded)
    );
    Ok(())
}

fn mse(predictions: &Matrix, targets: &[f32]) -> f32 {
    if targets.is_empty() {
        return 0.0;
    }
    let sum: f32 = predictions
        .as_slice()
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    sum / targets.len() as f32
}

fn accuracy(predictions: &Matrix, targets: &[f32]) -> f32 {
    if targets.is_empty() {
        return 0.0;
    }
    let hits = predictions
        .as_slice()
        .iter()
        .zip(targets)
        .filter(|(p, t)| (**p >= 0.5) == (**t >= 0.5))
        .count();
    hits as f32 / targets.len() as f32
}

fn max_abs_diff(a: &Matrix, b: &Matrix) -> f32 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}
