//! Random filter sampling.

use log::{debug, error, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{Dataset, Sample};
use crate::error::{DesignError, Result};
use crate::filters::{ComponentValues, FilterSpec, FrequencyResponse, MnaBackend, Topology};
use crate::solver::{ensure_available, FrequencySweep};

/// Resistance sampling interval in ohms.
pub const RESISTANCE_RANGE: (f64, f64) = (1.0e3, 1.0e4);
/// Capacitance sampling interval in farads.
pub const CAPACITANCE_RANGE: (f64, f64) = (1.0e-9, 1.0e-6);
/// Inductance sampling interval in henries (inductor topologies only).
pub const INDUCTANCE_RANGE: (f64, f64) = (1.0e-6, 1.0e-3);

/// Samples drawn when no count is given.
pub const DEFAULT_COUNT: usize = 1000;

/// Configuration for dataset generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of samples to draw.
    pub count: usize,
    /// Seed for reproducible draws; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(DesignError::invalid_config("sample count must be positive"));
        }
        Ok(())
    }
}

/// Draws random filters and simulates them.
///
/// Topologies are chosen uniformly; R and C are drawn uniformly from their
/// ranges for every topology and L only for topologies with an inductor.
pub struct DatasetGenerator<B: FrequencyResponse = MnaBackend> {
    config: GeneratorConfig,
    backend: B,
    rng: StdRng,
}

impl DatasetGenerator<MnaBackend> {
    /// Create a generator backed by the built-in solver.
    ///
    /// Fails with `BackendUnavailable` if the solver self-check does not pass.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        ensure_available()?;
        Self::with_backend(config, MnaBackend)
    }
}

impl<B: FrequencyResponse> DatasetGenerator<B> {
    /// Create a generator with a specific response backend.
    pub fn with_backend(config: GeneratorConfig, backend: B) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self { config, backend, rng })
    }

    /// Draw one random filter.
    pub fn sample_spec(&mut self) -> Result<FilterSpec> {
        let topology = Topology::ALL[self.rng.random_range(0..Topology::ALL.len())];
        let resistance = self.draw(RESISTANCE_RANGE);
        let capacitance = self.draw(CAPACITANCE_RANGE);
        let values = if topology.uses_inductor() {
            let inductance = self.draw(INDUCTANCE_RANGE);
            ComponentValues::rlc(resistance, inductance, capacitance)
        } else {
            ComponentValues::rc(resistance, capacitance)
        };
        FilterSpec::new(topology, &values)
    }

    /// Generate `count` samples over `sweep`.
    ///
    /// The first failing simulation aborts the whole run; no partial
    /// dataset is returned.
    pub fn generate(&mut self, sweep: &FrequencySweep) -> Result<Dataset> {
        let count = self.config.count;
        info!(
            "Generating {} samples over {} frequencies ({:.1} Hz to {:.1} Hz)",
            count,
            sweep.len(),
            sweep.start(),
            sweep.stop()
        );

        let progress_step = (count / 10).max(1);
        let mut samples = Vec::with_capacity(count);
        for i in 0..count {
            let spec = self.sample_spec()?;
            let response = self.simulate(&spec, sweep).inspect_err(|e| {
                error!("Sample {} ({}) failed: {}", i, spec, e);
            })?;
            debug!("Sample {}: {}", i, spec);
            samples.push(Sample { spec, response });

            if (i + 1) % progress_step == 0 {
                info!("Generated {}/{} samples", i + 1, count);
            }
        }

        Dataset::new(sweep.clone(), samples)
    }

    fn simulate(&self, spec: &FilterSpec, sweep: &FrequencySweep) -> Result<Vec<f64>> {
        let response = self.backend.response(spec, sweep)?;
        if response.len() != sweep.len() {
            return Err(DesignError::dimension_mismatch("simulated response", sweep.len(), response.len()));
        }
        if let Some((f, m)) = sweep
            .points()
            .iter()
            .zip(&response)
            .find(|(_, m)| !m.is_finite() || **m < 0.0)
        {
            return Err(DesignError::simulation_failure(*f, format!("invalid magnitude {}", m)));
        }
        Ok(response)
    }

    fn draw(&mut self, (low, high): (f64, f64)) -> f64 {
        self.rng.random_range(low..=high)
    }
}
