//! Training configuration.

use std::path::PathBuf;

use crate::error::{DesignError, Result};

/// Configuration for [`super::Trainer`].
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Maximum number of epochs.
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Epochs without improvement before stopping.
    pub patience: usize,
    /// Smallest validation-loss decrease that counts as an improvement.
    pub min_delta: f32,
    /// Share of the samples held out for validation.
    pub validation_fraction: f64,
    /// Seed for the split and batch order; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Where the best model is written.
    pub checkpoint_path: PathBuf,
    /// Where per-epoch losses are written.
    pub metrics_path: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 1e-3,
            patience: 5,
            min_delta: 1e-6,
            validation_fraction: 0.1,
            seed: None,
            checkpoint_path: PathBuf::from("model.json"),
            metrics_path: PathBuf::from("metrics.csv"),
        }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_min_delta(mut self, min_delta: f32) -> Self {
        self.min_delta = min_delta;
        self
    }

    pub fn with_validation_fraction(mut self, fraction: f64) -> Self {
        self.validation_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = path.into();
        self
    }

    pub fn with_metrics_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(DesignError::invalid_config("epochs must be positive"));
        }
        if self.batch_size == 0 {
            return Err(DesignError::invalid_config("batch size must be positive"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(DesignError::invalid_config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(DesignError::invalid_config(format!(
                "validation fraction must lie in (0, 1), got {}",
                self.validation_fraction
            )));
        }
        if !(self.min_delta.is_finite() && self.min_delta >= 0.0) {
            return Err(DesignError::invalid_config("min_delta must be non-negative"));
        }
        Ok(())
    }

    /// Rows held out for validation: at least one, never all of them.
    pub fn validation_size(&self, samples: usize) -> Result<usize> {
        if samples < 2 {
            return Err(DesignError::invalid_config(format!(
                "need at least 2 samples to split into training and validation, got {}",
                samples
            )));
        }
        let size = (samples as f64 * self.validation_fraction).floor() as usize;
        Ok(size.clamp(1, samples - 1))
    }
}
