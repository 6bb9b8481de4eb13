//! Inverse design: from a target magnitude response to component values.
//!
//! A [`Designer`] wraps a trained model and the sweep it was trained on.
//! Decoding is deterministic: the encoder's latent mean is decoded without
//! sampling noise, so the same target always yields the same filter.

use std::path::Path;

use log::{info, warn};
use ndarray::Array2;
use serde::Serialize;

use crate::error::{DesignError, Result};
use crate::filters::{ComponentValues, FilterSpec, FrequencyResponse, MnaBackend, Topology};
use crate::model::{Checkpoint, Mode, Vae};
use crate::solver::FrequencySweep;

/// Smallest component value a prediction is clamped to.
pub const VALUE_FLOOR: f64 = 1e-12;

/// Offset added before taking `20 log10` of a magnitude.
const DB_FLOOR: f64 = 1e-12;

/// A trained model ready to propose filters.
pub struct Designer<B: FrequencyResponse = MnaBackend> {
    model: Vae,
    sweep: FrequencySweep,
    backend: B,
}

impl Designer<MnaBackend> {
    /// Load a checkpoint and rebuild its model.
    pub fn from_checkpoint(path: impl AsRef<Path>) -> Result<Self> {
        let checkpoint = Checkpoint::load(path.as_ref())?;
        info!(
            "Loaded {} model trained on {} frequencies from {}",
            checkpoint.model.architecture,
            checkpoint.freqs.len(),
            path.as_ref().display()
        );
        Self::new(checkpoint.to_model()?, checkpoint.sweep()?, MnaBackend)
    }
}

impl<B: FrequencyResponse> Designer<B> {
    /// Pair a model with its training sweep and a response backend.
    pub fn new(model: Vae, sweep: FrequencySweep, backend: B) -> Result<Self> {
        if model.config().input_dim != sweep.len() + 1 {
            return Err(DesignError::dimension_mismatch(
                "model input width",
                sweep.len() + 1,
                model.config().input_dim,
            ));
        }
        Ok(Self { model, sweep, backend })
    }

    /// The sweep targets must be sampled on.
    pub fn sweep(&self) -> &FrequencySweep {
        &self.sweep
    }

    /// Predict component values whose response should match `target`.
    pub fn design(&mut self, target: &[f64], topology: Topology) -> Result<FilterSpec> {
        if target.len() != self.sweep.len() {
            return Err(DesignError::dimension_mismatch("target response", self.sweep.len(), target.len()));
        }

        let width = target.len() + 1;
        let x = Array2::from_shape_fn((1, width), |(_, j)| {
            if j == target.len() {
                topology.index() as f32
            } else {
                target[j] as f32
            }
        });
        let pass = self.model.forward(x.view(), Mode::Eval)?;

        let mut params = [0.0; 3];
        for (slot, (&value, name)) in params.iter_mut().zip(pass.recon.row(0).iter().zip(["R", "L", "C"])) {
            let value = f64::from(value);
            *slot = if value >= VALUE_FLOOR {
                value
            } else {
                if name != "L" || topology.uses_inductor() {
                    warn!("Predicted {} = {:e} clamped to {:e}", name, value, VALUE_FLOOR);
                }
                VALUE_FLOOR
            };
        }

        let spec = FilterSpec::from_params(topology, params)?;
        info!("Designed {}", spec);
        Ok(spec)
    }

    /// Simulate `target`, design from its response, re-simulate the design
    /// and compare the two responses.
    pub fn evaluate(&mut self, target: &FilterSpec) -> Result<DesignReport> {
        let target_response = self.backend.response(target, &self.sweep)?;
        let designed = self.design(&target_response, target.topology)?;
        let designed_response = self.backend.response(&designed, &self.sweep)?;

        let report = DesignReport {
            target: *target,
            designed,
            freqs: self.sweep.points().to_vec(),
            target_response,
            designed_response,
        };
        info!(
            "Response error: rms {:.3} dB, max {:.3} dB",
            report.rms_db_error(),
            report.max_db_error()
        );
        Ok(report)
    }

    /// [`Self::evaluate`] for a target given as raw component values.
    ///
    /// The values are checked against the topology before anything is
    /// simulated, so a bandpass target without an inductance fails with
    /// `MissingParameter`.
    pub fn evaluate_values(&mut self, topology: Topology, values: &ComponentValues) -> Result<DesignReport> {
        let target = FilterSpec::new(topology, values)?;
        self.evaluate(&target)
    }
}

/// Load `checkpoint` and design a filter for `target`.
pub fn design(checkpoint: impl AsRef<Path>, target: &[f64], topology: Topology) -> Result<FilterSpec> {
    Designer::from_checkpoint(checkpoint)?.design(target, topology)
}

/// Target and designed filters with their simulated responses.
#[derive(Debug, Clone)]
pub struct DesignReport {
    pub target: FilterSpec,
    pub designed: FilterSpec,
    pub freqs: Vec<f64>,
    pub target_response: Vec<f64>,
    pub designed_response: Vec<f64>,
}

#[derive(Serialize)]
struct ComparisonRow {
    freq_hz: f64,
    target_db: f64,
    designed_db: f64,
}

/// Magnitude in decibels.
pub fn to_db(magnitude: f64) -> f64 {
    20.0 * (magnitude + DB_FLOOR).log10()
}

impl DesignReport {
    fn db_errors(&self) -> impl Iterator<Item = f64> + '_ {
        self.target_response
            .iter()
            .zip(&self.designed_response)
            .map(|(&t, &d)| to_db(d) - to_db(t))
    }

    /// Root-mean-square difference of the two responses in dB.
    pub fn rms_db_error(&self) -> f64 {
        let n = self.target_response.len().max(1) as f64;
        (self.db_errors().map(|e| e * e).sum::<f64>() / n).sqrt()
    }

    /// Largest absolute difference of the two responses in dB.
    pub fn max_db_error(&self) -> f64 {
        self.db_errors().map(f64::abs).fold(0.0, f64::max)
    }

    /// Write `freq_hz,target_db,designed_db` rows for plotting.
    pub fn write_comparison(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let csv_err = |source| DesignError::MetricsLog {
            path: path.display().to_string(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        for ((&freq_hz, &t), &d) in self.freqs.iter().zip(&self.target_response).zip(&self.designed_response) {
            writer
                .serialize(ComparisonRow {
                    freq_hz,
                    target_db: to_db(t),
                    designed_db: to_db(d),
                })
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|e| DesignError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;

        info!("Wrote response comparison to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Architecture, VaeConfig};
    use approx::assert_relative_eq;

    fn designer(points: usize) -> Designer {
        let sweep = FrequencySweep::logspace(1.0, 6.0, points).unwrap();
        let config = VaeConfig::new(Architecture::Shallow, points + 1)
            .with_hidden_dim(8)
            .with_latent_dim(2)
            .with_seed(8);
        Designer::new(Vae::new(config).unwrap(), sweep, MnaBackend).unwrap()
    }

    #[test]
    fn test_design_respects_topology_contract() {
        let mut designer = designer(10);
        let target = vec![0.5; 10];

        let lowpass = designer.design(&target, Topology::Lowpass).unwrap();
        assert_eq!(lowpass.inductance, 0.0);
        assert!(lowpass.resistance > 0.0 && lowpass.capacitance > 0.0);

        let bandpass = designer.design(&target, Topology::Bandpass).unwrap();
        assert!(bandpass.inductance > 0.0);
    }

    #[test]
    fn test_design_is_deterministic() {
        let mut designer = designer(10);
        let target: Vec<f64> = (0..10).map(|i| 1.0 / (1.0 + i as f64)).collect();
        let a = designer.design(&target, Topology::Highpass).unwrap();
        let b = designer.design(&target, Topology::Highpass).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_target_length_checked() {
        let mut designer = designer(10);
        assert!(matches!(
            designer.design(&[1.0; 9], Topology::Lowpass),
            Err(DesignError::DimensionMismatch { expected: 10, got: 9, .. })
        ));
    }

    #[test]
    fn test_mismatched_model_rejected() {
        let sweep = FrequencySweep::logspace(1.0, 6.0, 5).unwrap();
        let config = VaeConfig::new(Architecture::Shallow, 11).with_seed(1);
        assert!(matches!(
            Designer::new(Vae::new(config).unwrap(), sweep, MnaBackend),
            Err(DesignError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_evaluate_and_comparison_file() {
        let mut designer = designer(12);
        let target = FilterSpec::new(Topology::Lowpass, &ComponentValues::rc(1e3, 1e-8)).unwrap();
        let report = designer.evaluate(&target).unwrap();

        assert_eq!(report.target, target);
        assert_eq!(report.target_response.len(), 12);
        assert_eq!(report.designed_response.len(), 12);
        assert!(report.rms_db_error().is_finite());
        assert!(report.max_db_error() >= report.rms_db_error() - 1e-9);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison.csv");
        report.write_comparison(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("freq_hz,target_db,designed_db"));
        assert_eq!(lines.count(), 12);
    }

    #[test]
    fn test_missing_component_rejected_before_simulation() {
        let mut designer = designer(10);
        let result = designer.evaluate_values(Topology::Bandpass, &ComponentValues::rc(1e3, 1e-8));
        assert!(matches!(
            result,
            Err(DesignError::MissingParameter { ref param, .. }) if param == "L"
        ));

        let no_capacitor = ComponentValues {
            resistance: Some(1e3),
            inductance: None,
            capacitance: None,
        };
        assert!(matches!(
            designer.evaluate_values(Topology::Lowpass, &no_capacitor),
            Err(DesignError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_db_conversion() {
        assert_relative_eq!(to_db(1.0), 0.0, epsilon = 1e-9);
        assert_relative_eq!(to_db(0.1), -20.0, epsilon = 1e-6);
        assert!(to_db(0.0).is_finite());
    }

    #[test]
    fn test_identical_responses_have_zero_error() {
        let spec = FilterSpec::new(Topology::Lowpass, &ComponentValues::rc(1e3, 1e-9)).unwrap();
        let report = DesignReport {
            target: spec,
            designed: spec,
            freqs: vec![10.0, 100.0],
            target_response: vec![1.0, 0.5],
            designed_response: vec![1.0, 0.5],
        };
        assert_eq!(report.rms_db_error(), 0.0);
        assert_eq!(report.max_db_error(), 0.0);
    }
}
