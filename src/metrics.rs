use std::collections::VecDeque;

use crate::config::MetricKind;

/// Summary of one `train` call.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Epochs actually run.
    pub epochs: usize,
    /// Total mini-batch updates performed.
    pub batches: usize,
    /// Loss of the final batch (including regularization penalties).
    pub final_loss: f32,
    /// Value of the configured metric over the last epoch, if any.
    pub metric: Option<f32>,
}

/// Rolling window over recent batch losses.
pub struct TrainingMetrics {
    batch_losses: VecDeque<f32>,
    capacity: usize,
    total_batches: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            batch_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_batches: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_loss(&mut self, loss: f32) {
        self.total_batches += 1;
        self.batch_losses.push_back(loss);
        if self.batch_losses.len() > self.capacity {
            self.batch_losses.pop_front();
        }
    }

    /// Average loss over the last N batches.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.batch_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.batch_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    pub fn last_loss(&self) -> f32 {
        self.batch_losses.back().copied().unwrap_or(0.0)
    }

    pub fn total_batches(&self) -> usize {
        self.total_batches
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricKind {
    /// Evaluate the metric over flat row-major predictions and targets of
    /// identical shape.
    pub fn evaluate(&self, predictions: &[f32], targets: &[f32]) -> f32 {
        match self {
            MetricKind::Accuracy => {
                if predictions.is_empty() {
                    return 0.0;
                }
                let hits = predictions
                    .iter()
                    .zip(targets)
                    .filter(|(p, t)| (**p >= 0.5) == (**t >= 0.5))
                    .count();
                hits as f32 / predictions.len() as f32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_average_loss() {
        let mut metrics = TrainingMetrics::with_capacity(3);
        for loss in [4.0, 3.0, 2.0, 1.0] {
            metrics.record_loss(loss);
        }
        // Window keeps the last 3: [3, 2, 1]
        assert!((metrics.average_loss(3) - 2.0).abs() < 1e-6);
        assert!((metrics.average_loss(2) - 1.5).abs() < 1e-6);
        assert_eq!(metrics.total_batches(), 4);
        assert_eq!(metrics.last_loss(), 1.0);
    }

    #[test]
    fn test_average_loss_empty_window() {
        let metrics = TrainingMetrics::new();
        assert_eq!(metrics.average_loss(10), 0.0);
        assert_eq!(metrics.last_loss(), 0.0);
    }

    #[test]
    fn test_accuracy_thresholds_at_half() {
        let predictions = [0.9, 0.2, 0.51, 0.49];
        let targets = [1.0, 0.0, 0.0, 1.0];
        let acc = MetricKind::Accuracy.evaluate(&predictions, &targets);
        assert!((acc - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_accuracy_empty_input() {
        assert_eq!(MetricKind::Accuracy.evaluate(&[], &[]), 0.0);
    }
}
