//! Model checkpoints.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use super::{Vae, VaeConfig};
use crate::error::{DesignError, Result};
use crate::solver::FrequencySweep;

/// Version written by this build; older or newer files are rejected.
pub const FORMAT_VERSION: u32 = 1;

/// Trained weights plus the frequency grid they were trained on.
///
/// The grid fixes the model's input width (`len(freqs) + 1`), so it
/// travels with the weights and is checked on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format_version: u32,
    pub model: VaeConfig,
    pub freqs: Vec<f64>,
    pub weights: Vec<Vec<f32>>,
}

impl Checkpoint {
    /// Snapshot a model together with its training sweep.
    pub fn new(model: &Vae, sweep: &FrequencySweep) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            model: model.config().clone(),
            freqs: sweep.points().to_vec(),
            weights: model.weights(),
        }
    }

    /// Write atomically: a reader sees either the previous file or this one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec(self).map_err(|source| DesignError::CheckpointFormat {
            path: path.display().to_string(),
            source,
        })?;

        let tmp = temp_path(path);
        let write_err = |e| DesignError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        };
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;

        info!("Saved checkpoint to {}", path.display());
        Ok(())
    }

    /// Read and validate a checkpoint.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| DesignError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let checkpoint: Checkpoint = serde_json::from_slice(&bytes).map_err(|source| DesignError::CheckpointFormat {
            path: path.display().to_string(),
            source,
        })?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Check the version and that the sweep agrees with the model width.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(DesignError::invalid_config(format!(
                "unsupported checkpoint format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.model.input_dim != self.freqs.len() + 1 {
            return Err(DesignError::dimension_mismatch(
                "checkpoint input width",
                self.freqs.len() + 1,
                self.model.input_dim,
            ));
        }
        Ok(())
    }

    /// The training sweep.
    pub fn sweep(&self) -> Result<FrequencySweep> {
        FrequencySweep::from_points(self.freqs.clone())
    }

    /// Rebuild the model and load its weights.
    pub fn to_model(&self) -> Result<Vae> {
        self.validate()?;
        let mut model = Vae::new(self.model.clone())?;
        model.load_weights(&self.weights)?;
        Ok(model)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Architecture, Mode};
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn model_and_sweep() -> (Vae, FrequencySweep) {
        let sweep = FrequencySweep::logspace(1.0, 6.0, 8).unwrap();
        let config = VaeConfig::new(Architecture::Shallow, sweep.len() + 1)
            .with_hidden_dim(5)
            .with_latent_dim(3)
            .with_seed(21);
        (Vae::new(config).unwrap(), sweep)
    }

    #[test]
    fn test_round_trip_preserves_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let (mut model, sweep) = model_and_sweep();

        Checkpoint::new(&model, &sweep).save(&path).unwrap();
        assert!(!temp_path(&path).exists());

        let checkpoint = Checkpoint::load(&path).unwrap();
        assert_eq!(checkpoint.sweep().unwrap(), sweep);

        let mut restored = checkpoint.to_model().unwrap();
        let x = Array2::from_elem((2, sweep.len() + 1), 0.25f32);
        let expected = model.forward(x.view(), Mode::Eval).unwrap().recon;
        let actual = restored.forward(x.view(), Mode::Eval).unwrap().recon;
        for (a, b) in expected.iter().zip(actual.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let (model, sweep) = model_and_sweep();

        let mut checkpoint = Checkpoint::new(&model, &sweep);
        checkpoint.freqs.pop();
        checkpoint.save(&path).unwrap();

        assert!(matches!(
            Checkpoint::load(&path),
            Err(DesignError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_weights_rejected() {
        let (model, sweep) = model_and_sweep();
        let mut checkpoint = Checkpoint::new(&model, &sweep);
        checkpoint.weights.truncate(2);
        assert!(matches!(
            checkpoint.to_model(),
            Err(DesignError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            Checkpoint::load(&path),
            Err(DesignError::CheckpointFormat { .. })
        ));
    }
}
