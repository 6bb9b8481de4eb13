//! Frequency grids for AC analysis.

use std::fmt;
use std::str::FromStr;

use crate::error::{DesignError, Result};

/// Lowest frequency of the default grid (Hz).
pub const DEFAULT_START_HZ: f64 = 10.0;
/// Highest frequency of the default grid (Hz).
pub const DEFAULT_STOP_HZ: f64 = 1.0e6;
/// Number of points of the default grid.
pub const DEFAULT_POINTS: usize = 200;

/// Point distribution of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    Linear,
    Logarithmic,
}

impl FromStr for Spacing {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lin" | "linear" => Ok(Spacing::Linear),
            "log" | "logarithmic" | "dec" => Ok(Spacing::Logarithmic),
            other => Err(DesignError::invalid_config(format!("unknown sweep spacing: {}", other))),
        }
    }
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spacing::Linear => write!(f, "linear"),
            Spacing::Logarithmic => write!(f, "log"),
        }
    }
}

/// An ordered set of strictly increasing, positive frequencies.
///
/// Every sample of a dataset and every checkpoint shares one sweep, so
/// responses are comparable element by element.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySweep {
    points: Vec<f64>,
}

impl FrequencySweep {
    /// Build a sweep of `points` frequencies from `start` to `stop` inclusive.
    pub fn new(start: f64, stop: f64, points: usize, spacing: Spacing) -> Result<Self> {
        if !start.is_finite() || !stop.is_finite() || start <= 0.0 {
            return Err(DesignError::invalid_config(format!(
                "sweep bounds must be finite and positive, got {} to {}",
                start, stop
            )));
        }
        if points == 0 {
            return Err(DesignError::invalid_config("sweep needs at least one point"));
        }
        if points == 1 {
            return Self::from_points(vec![start]);
        }
        if stop <= start {
            return Err(DesignError::invalid_config(format!(
                "sweep stop {} must exceed start {}",
                stop, start
            )));
        }

        let last = (points - 1) as f64;
        let mut grid: Vec<f64> = match spacing {
            Spacing::Linear => {
                let step = (stop - start) / last;
                (0..points).map(|i| start + step * i as f64).collect()
            }
            Spacing::Logarithmic => {
                let (lo, hi) = (start.log10(), stop.log10());
                let step = (hi - lo) / last;
                (0..points).map(|i| 10f64.powf(lo + step * i as f64)).collect()
            }
        };
        grid[0] = start;
        grid[points - 1] = stop;

        Self::from_points(grid)
    }

    /// `points` logarithmically spaced frequencies between `10^start_decade`
    /// and `10^stop_decade`.
    pub fn logspace(start_decade: f64, stop_decade: f64, points: usize) -> Result<Self> {
        Self::new(
            10f64.powf(start_decade),
            10f64.powf(stop_decade),
            points,
            Spacing::Logarithmic,
        )
    }

    /// Wrap an explicit list of frequencies.
    pub fn from_points(points: Vec<f64>) -> Result<Self> {
        if points.is_empty() {
            return Err(DesignError::invalid_config("frequency sweep is empty"));
        }
        if let Some(bad) = points.iter().find(|f| !f.is_finite() || **f <= 0.0) {
            return Err(DesignError::invalid_config(format!(
                "frequencies must be finite and positive, got {}",
                bad
            )));
        }
        if let Some(pair) = points.windows(2).find(|w| w[1] <= w[0]) {
            return Err(DesignError::invalid_config(format!(
                "frequencies must be strictly increasing, got {} then {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { points })
    }

    /// The frequencies in Hz.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn stop(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn into_points(self) -> Vec<f64> {
        self.points
    }
}

impl Default for FrequencySweep {
    fn default() -> Self {
        let (lo, hi) = (DEFAULT_START_HZ.log10(), DEFAULT_STOP_HZ.log10());
        let step = (hi - lo) / (DEFAULT_POINTS - 1) as f64;
        let points = (0..DEFAULT_POINTS)
            .map(|i| 10f64.powf(lo + step * i as f64))
            .collect();
        Self { points }
    }
}
