//! The training loop.

use std::fmt;

use log::{debug, error, info, warn};
use ndarray::{Array2, ArrayView2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use super::{EarlyStopping, EpochMetrics, MetricsLog, TrainConfig, Verdict};
use crate::dataset::Dataset;
use crate::error::{DesignError, Result};
use crate::model::{Adam, Checkpoint, Mode, Vae, OUTPUT_DIM};
use crate::solver::FrequencySweep;

/// Why training ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Validation loss stopped improving.
    EarlyStop,
    /// The configured number of epochs ran.
    EpochLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EarlyStop => write!(f, "early stop"),
            StopReason::EpochLimit => write!(f, "epoch limit"),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs_run: usize,
    pub best_val_loss: f32,
    pub stop_reason: StopReason,
    pub history: Vec<EpochMetrics>,
}

/// Fits a [`Vae`] with Adam, validation-based checkpointing and early
/// stopping.
pub struct Trainer {
    config: TrainConfig,
    model: Vae,
    optimizer: Adam,
    rng: StdRng,
}

impl Trainer {
    pub fn new(config: TrainConfig, model: Vae) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let optimizer = Adam::new(config.learning_rate);
        Ok(Self {
            config,
            model,
            optimizer,
            rng,
        })
    }

    pub fn model(&self) -> &Vae {
        &self.model
    }

    pub fn into_model(self) -> Vae {
        self.model
    }

    /// Train on a dataset.
    pub fn fit_dataset(&mut self, dataset: &Dataset) -> Result<TrainReport> {
        let features = dataset.features();
        let targets = dataset.targets();
        self.fit(features.view(), targets.view(), dataset.sweep())
    }

    /// Train on `features` (`len(sweep) + 1` columns) and `targets`
    /// (R, L, C columns).
    ///
    /// The checkpoint at `checkpoint_path` is rewritten every time the
    /// validation loss improves; any non-finite loss aborts the run.
    pub fn fit(
        &mut self,
        features: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        sweep: &FrequencySweep,
    ) -> Result<TrainReport> {
        self.check_shapes(features, targets, sweep)?;

        let n = features.nrows();
        let val_size = self.config.validation_size(n)?;
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut self.rng);
        let (val_idx, train_idx) = order.split_at(val_size);
        let val_idx = val_idx.to_vec();
        let mut train_idx = train_idx.to_vec();

        info!(
            "Training {} model ({} parameters) on {} samples, validating on {}",
            self.model.config().architecture,
            self.model.num_params(),
            train_idx.len(),
            val_idx.len()
        );

        let mut metrics = MetricsLog::create(&self.config.metrics_path)?;
        let mut stopper = EarlyStopping::new(self.config.patience, self.config.min_delta);
        let mut history = Vec::with_capacity(self.config.epochs);
        let mut stop_reason = StopReason::EpochLimit;

        for epoch in 1..=self.config.epochs {
            train_idx.shuffle(&mut self.rng);
            let train_loss = self.train_epoch(features, targets, &train_idx)?;
            let val_loss = self.evaluate(features, targets, &val_idx)?;

            let row = EpochMetrics {
                epoch,
                train_loss,
                val_loss,
            };
            metrics.append(&row)?;

            if !train_loss.is_finite() || !val_loss.is_finite() {
                error!("Epoch {}: loss is not finite (train={} val={})", epoch, train_loss, val_loss);
                return Err(DesignError::TrainingDiverged { epoch });
            }

            history.push(row);
            info!("Epoch {}: train={:.4} val={:.4}", epoch, train_loss, val_loss);

            match stopper.observe(val_loss) {
                Verdict::Improved => {
                    Checkpoint::new(&self.model, sweep).save(&self.config.checkpoint_path)?;
                }
                Verdict::Stalled => {}
                Verdict::Stop => {
                    warn!("Early stopping: no improvement for {} epochs", self.config.patience);
                    stop_reason = StopReason::EarlyStop;
                    break;
                }
            }
        }

        let report = TrainReport {
            epochs_run: history.len(),
            best_val_loss: stopper.best(),
            stop_reason,
            history,
        };
        info!(
            "Training finished after {} epochs ({}), best val loss {:.4}",
            report.epochs_run, report.stop_reason, report.best_val_loss
        );
        Ok(report)
    }

    /// One pass over the training rows; returns the mean batch loss.
    fn train_epoch(&mut self, features: ArrayView2<f32>, targets: ArrayView2<f32>, rows: &[usize]) -> Result<f32> {
        let mut total = 0.0;
        let mut batches = 0;

        for (i, chunk) in rows.chunks(self.config.batch_size).enumerate() {
            let (x, y) = select(features, targets, chunk);
            let pass = self.model.forward(x.view(), Mode::Train)?;
            let loss = self.model.loss(&pass, y.view());
            self.model.backward(&pass, y.view());
            self.optimizer.step(self.model.param_groups())?;

            debug!("batch {}: loss={:.6} recon={:.6} kld={:.6}", i, loss.total, loss.recon, loss.kld);
            total += loss.total;
            batches += 1;
        }

        Ok(total / batches.max(1) as f32)
    }

    /// Mean batch loss over `rows` without updating parameters.
    fn evaluate(&mut self, features: ArrayView2<f32>, targets: ArrayView2<f32>, rows: &[usize]) -> Result<f32> {
        let mut total = 0.0;
        let mut batches = 0;

        for chunk in rows.chunks(self.config.batch_size) {
            let (x, y) = select(features, targets, chunk);
            let pass = self.model.forward(x.view(), Mode::Eval)?;
            total += self.model.loss(&pass, y.view()).total;
            batches += 1;
        }

        Ok(total / batches.max(1) as f32)
    }

    fn check_shapes(&self, features: ArrayView2<f32>, targets: ArrayView2<f32>, sweep: &FrequencySweep) -> Result<()> {
        let input_dim = self.model.config().input_dim;
        if input_dim != sweep.len() + 1 {
            return Err(DesignError::dimension_mismatch("model input width", sweep.len() + 1, input_dim));
        }
        if features.ncols() != input_dim {
            return Err(DesignError::dimension_mismatch("feature columns", input_dim, features.ncols()));
        }
        if targets.ncols() != OUTPUT_DIM {
            return Err(DesignError::dimension_mismatch("target columns", OUTPUT_DIM, targets.ncols()));
        }
        if targets.nrows() != features.nrows() {
            return Err(DesignError::dimension_mismatch("target rows", features.nrows(), targets.nrows()));
        }
        Ok(())
    }
}

fn select(features: ArrayView2<f32>, targets: ArrayView2<f32>, rows: &[usize]) -> (Array2<f32>, Array2<f32>) {
    (features.select(Axis(0), rows), targets.select(Axis(0), rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Architecture, VaeConfig};

    const FREQS: usize = 6;

    fn toy_data(n: usize) -> (Array2<f32>, Array2<f32>, FrequencySweep) {
        let sweep = FrequencySweep::logspace(1.0, 6.0, FREQS).unwrap();
        let features = Array2::from_shape_fn((n, FREQS + 1), |(i, j)| ((i + j) % 3) as f32 * 0.5);
        let targets = Array2::from_elem((n, OUTPUT_DIM), 0.5);
        (features, targets, sweep)
    }

    fn toy_model(seed: u64) -> Vae {
        let config = VaeConfig::new(Architecture::Shallow, FREQS + 1)
            .with_hidden_dim(8)
            .with_latent_dim(2)
            .with_seed(seed);
        Vae::new(config).unwrap()
    }

    #[test]
    fn test_one_epoch_writes_checkpoint_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainConfig::new()
            .with_epochs(1)
            .with_batch_size(8)
            .with_seed(3)
            .with_checkpoint_path(dir.path().join("model.json"))
            .with_metrics_path(dir.path().join("metrics.csv"));
        let (features, targets, sweep) = toy_data(40);

        let mut trainer = Trainer::new(config, toy_model(1)).unwrap();
        let report = trainer.fit(features.view(), targets.view(), &sweep).unwrap();

        assert_eq!(report.epochs_run, 1);
        assert_eq!(report.stop_reason, StopReason::EpochLimit);
        assert!(report.best_val_loss.is_finite());
        assert!(dir.path().join("model.json").exists());

        let checkpoint = Checkpoint::load(dir.path().join("model.json")).unwrap();
        assert_eq!(checkpoint.sweep().unwrap(), sweep);

        let metrics = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 2);
        assert!(metrics.starts_with("epoch,train_loss,val_loss"));
    }

    #[test]
    fn test_constant_target_loss_decreases() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainConfig::new()
            .with_epochs(30)
            .with_batch_size(8)
            .with_learning_rate(1e-2)
            .with_patience(30)
            .with_seed(4)
            .with_checkpoint_path(dir.path().join("model.json"))
            .with_metrics_path(dir.path().join("metrics.csv"));
        let (features, targets, sweep) = toy_data(80);

        let mut trainer = Trainer::new(config, toy_model(2)).unwrap();
        let report = trainer.fit(features.view(), targets.view(), &sweep).unwrap();

        let first = report.history[0].val_loss;
        assert!(report.best_val_loss < first);
        assert!(report.history.iter().all(|m| m.val_loss.is_finite() && m.train_loss.is_finite()));
    }

    #[test]
    fn test_early_stop_without_improvement() {
        let dir = tempfile::tempdir().unwrap();
        // Updates far below f32 resolution: validation loss never moves
        let config = TrainConfig::new()
            .with_epochs(20)
            .with_batch_size(8)
            .with_learning_rate(1e-12)
            .with_patience(2)
            .with_seed(5)
            .with_checkpoint_path(dir.path().join("model.json"))
            .with_metrics_path(dir.path().join("metrics.csv"));
        let (features, targets, sweep) = toy_data(40);

        let mut trainer = Trainer::new(config, toy_model(3)).unwrap();
        let report = trainer.fit(features.view(), targets.view(), &sweep).unwrap();

        assert_eq!(report.stop_reason, StopReason::EarlyStop);
        assert!(report.epochs_run <= 4);
    }

    #[test]
    fn test_shape_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainConfig::new()
            .with_checkpoint_path(dir.path().join("model.json"))
            .with_metrics_path(dir.path().join("metrics.csv"));
        let (features, _, sweep) = toy_data(10);
        let targets = Array2::zeros((10, 2));

        let mut trainer = Trainer::new(config, toy_model(4)).unwrap();
        assert!(matches!(
            trainer.fit(features.view(), targets.view(), &sweep),
            Err(DesignError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_single_sample_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainConfig::new()
            .with_checkpoint_path(dir.path().join("model.json"))
            .with_metrics_path(dir.path().join("metrics.csv"));
        let (features, targets, sweep) = toy_data(1);

        let mut trainer = Trainer::new(config, toy_model(5)).unwrap();
        assert!(matches!(
            trainer.fit(features.view(), targets.view(), &sweep),
            Err(DesignError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_divergence_logs_epoch_and_skips_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainConfig::new()
            .with_epochs(5)
            .with_batch_size(8)
            .with_seed(6)
            .with_checkpoint_path(dir.path().join("model.json"))
            .with_metrics_path(dir.path().join("metrics.csv"));
        let (features, _, sweep) = toy_data(20);
        let targets = Array2::from_elem((20, OUTPUT_DIM), f32::INFINITY);

        let mut trainer = Trainer::new(config, toy_model(6)).unwrap();
        assert!(matches!(
            trainer.fit(features.view(), targets.view(), &sweep),
            Err(DesignError::TrainingDiverged { epoch: 1 })
        ));
        assert!(!dir.path().join("model.json").exists());

        let text = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("1,"));
    }
}
