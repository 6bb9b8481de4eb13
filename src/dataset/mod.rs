//! Labelled filter responses for training.
//!
//! A [`Dataset`] is an ordered list of [`Sample`]s that all share one
//! [`FrequencySweep`]. Samples are produced by [`DatasetGenerator`] and can
//! be persisted as an NPZ archive with four parallel arrays:
//!
//! | key            | dtype | shape   |
//! |----------------|-------|---------|
//! | `responses`    | f64   | [N, F]  |
//! | `params`       | f64   | [N, 3]  |
//! | `filter_types` | i64   | [N]     |
//! | `freqs`        | f64   | [F]     |
//!
//! `params` rows are ordered (R, L, C).

mod generator;
mod storage;

pub use generator::{
    DatasetGenerator, GeneratorConfig, CAPACITANCE_RANGE, DEFAULT_COUNT, INDUCTANCE_RANGE, RESISTANCE_RANGE,
};

use ndarray::Array2;

use crate::error::{DesignError, Result};
use crate::filters::FilterSpec;
use crate::solver::FrequencySweep;

/// One labelled example: a filter and its magnitude response.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub spec: FilterSpec,
    pub response: Vec<f64>,
}

impl Sample {
    /// Scalar topology indicator appended to the model input.
    pub fn topology_index(&self) -> usize {
        self.spec.topology.index()
    }
}

/// Samples sharing one frequency sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    sweep: FrequencySweep,
    samples: Vec<Sample>,
}

impl Dataset {
    /// Assemble a dataset, checking every response against the sweep length.
    pub fn new(sweep: FrequencySweep, samples: Vec<Sample>) -> Result<Self> {
        if let Some(bad) = samples.iter().find(|s| s.response.len() != sweep.len()) {
            return Err(DesignError::dimension_mismatch(
                "sample response",
                sweep.len(),
                bad.response.len(),
            ));
        }
        Ok(Self { sweep, samples })
    }

    pub fn sweep(&self) -> &FrequencySweep {
        &self.sweep
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Model width: one magnitude per sweep point plus the topology index.
    pub fn feature_dim(&self) -> usize {
        self.sweep.len() + 1
    }

    /// Model inputs, one row per sample: `response ‖ topology index`.
    pub fn features(&self) -> Array2<f32> {
        let width = self.feature_dim();
        Array2::from_shape_fn((self.len(), width), |(row, col)| {
            let sample = &self.samples[row];
            if col + 1 == width {
                sample.topology_index() as f32
            } else {
                sample.response[col] as f32
            }
        })
    }

    /// Regression targets, one `(R, L, C)` row per sample.
    pub fn targets(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.len(), 3), |(row, col)| self.samples[row].spec.params()[col] as f32)
    }
}
