//! Placeholder model.

use serde::{Deserialize, Serialize};
use std::ops::Mul;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Train and validation values for one chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitValues {
    pub train: f64,
    pub validation: f64,
}

/// One point on a training chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Epoch number, starting at 1.
    pub x: u32,
    pub y: SplitValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Charts {
    pub accuracy: ChartPoint,
    pub loss: ChartPoint,
}

/// Progress update emitted after each epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Fraction of epochs completed, 0.0 to 1.0.
    pub progress: f64,
    pub charts: Charts,
}

/// Rounds to three decimals from the exact binary value, ties to even.
fn round3(value: f64) -> f64 {
    format!("{:.3}", value).parse().unwrap_or(value)
}

impl TrainingMetrics {
    /// Synthetic metrics after `epoch` (1-based) of `total` epochs.
    pub fn for_epoch(epoch: u32, total: u32) -> Self {
        let step = |scale: f64| epoch as f64 * scale / total as f64;
        Self {
            progress: round3(epoch as f64 / total as f64),
            charts: Charts {
                accuracy: ChartPoint {
                    x: epoch,
                    y: SplitValues {
                        train: round3(0.8 + step(0.1)),
                        validation: round3(0.6 + step(0.2)),
                    },
                },
                loss: ChartPoint {
                    x: epoch,
                    y: SplitValues {
                        train: round3(0.8 - step(0.7)),
                        validation: round3(0.9 - step(0.6)),
                    },
                },
            },
        }
    }
}

/// A model that does not learn anything.
#[derive(Debug, Clone)]
pub struct Model {
    /// Time spent per fake epoch (default: 200ms).
    pub epoch_delay: Duration,
    weights: Option<PathBuf>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            epoch_delay: Duration::from_millis(200),
            weights: None,
        }
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epoch_delay(mut self, epoch_delay: Duration) -> Self {
        self.epoch_delay = epoch_delay;
        self
    }

    /// Runs `epochs` fake epochs, reporting metrics after each one.
    pub async fn train<F>(&self, epochs: u32, mut progress: F)
    where
        F: FnMut(&TrainingMetrics),
    {
        for epoch in 1..=epochs {
            tokio::time::sleep(self.epoch_delay).await;
            progress(&TrainingMetrics::for_epoch(epoch, epochs));
        }
    }

    /// Doubles the input.
    pub fn predict<T>(&self, x: T) -> T
    where
        T: Mul<Output = T> + From<u8>,
    {
        x * T::from(2)
    }

    /// Loads weights from `path`.
    pub fn load(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let weights = std::fs::read_to_string(path)?;
        tracing::info!(path = %path.display(), bytes = weights.len(), "Loaded model");
        self.weights = Some(path.to_path_buf());
        Ok(self)
    }

    /// Path the weights were loaded from, if any.
    pub fn weights(&self) -> Option<&Path> {
        self.weights.as_deref()
    }
}
