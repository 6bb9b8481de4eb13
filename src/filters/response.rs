//! Frequency-response simulation of filter specs.

use super::{ComponentValues, FilterSpec, Topology};
use crate::circuit::Circuit;
use crate::error::Result;
use crate::solver::{AcAnalysis, FrequencySweep};

/// Something that can compute the magnitude response of a filter.
pub trait FrequencyResponse {
    /// Output magnitudes, one per sweep point, in sweep order.
    fn response(&self, spec: &FilterSpec, sweep: &FrequencySweep) -> Result<Vec<f64>>;
}

/// Magnitude response from the built-in complex MNA solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MnaBackend;

impl FrequencyResponse for MnaBackend {
    fn response(&self, spec: &FilterSpec, sweep: &FrequencySweep) -> Result<Vec<f64>> {
        let circuit = Circuit::from_ast(&spec.netlist())?;
        AcAnalysis::new(circuit)?.magnitudes(sweep.points())
    }
}

/// Magnitude response of `topology` built from `values` over `sweep`.
pub fn simulate(topology: Topology, values: &ComponentValues, sweep: &FrequencySweep) -> Result<Vec<f64>> {
    let spec = FilterSpec::new(topology, values)?;
    MnaBackend.response(&spec, sweep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DesignError;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn corner(r: f64, c: f64) -> f64 {
        1.0 / (2.0 * PI * r * c)
    }

    #[test]
    fn test_lengths_and_non_negative() {
        let sweep = FrequencySweep::default();
        let cases = [
            (Topology::Lowpass, ComponentValues::rc(4.7e3, 2.2e-8)),
            (Topology::Highpass, ComponentValues::rc(1e4, 1e-6)),
            (Topology::Bandpass, ComponentValues::rlc(1e3, 1e-6, 1e-9)),
            (Topology::Bandpass, ComponentValues::rlc(9e3, 1e-3, 5e-7)),
        ];
        for (topology, values) in cases {
            let response = simulate(topology, &values, &sweep).unwrap();
            assert_eq!(response.len(), sweep.len());
            assert!(response.iter().all(|m| m.is_finite() && *m >= 0.0));
        }
    }

    #[test]
    fn test_lowpass_monotone_above_corner() {
        let (r, c) = (2.2e3, 4.7e-8);
        let sweep = FrequencySweep::default();
        let response = simulate(Topology::Lowpass, &ComponentValues::rc(r, c), &sweep).unwrap();

        let fc = corner(r, c);
        let above: Vec<f64> = sweep
            .points()
            .iter()
            .zip(&response)
            .filter(|(f, _)| **f >= fc)
            .map(|(_, m)| *m)
            .collect();
        assert!(above.len() > 10);
        assert!(above.windows(2).all(|w| w[1] <= w[0] + 1e-12));
    }

    #[test]
    fn test_highpass_monotone_below_corner() {
        let (r, c) = (1e4, 1e-8);
        let sweep = FrequencySweep::default();
        let response = simulate(Topology::Highpass, &ComponentValues::rc(r, c), &sweep).unwrap();

        let fc = corner(r, c);
        let below: Vec<f64> = sweep
            .points()
            .iter()
            .zip(&response)
            .filter(|(f, _)| **f <= fc)
            .map(|(_, m)| *m)
            .collect();
        assert!(below.len() > 10);
        assert!(below.windows(2).all(|w| w[1] + 1e-12 >= w[0]));
    }

    #[test]
    fn test_rc_lowpass_matches_analytic() {
        let (r, c) = (1000.0, 1e-9);
        let sweep = FrequencySweep::logspace(1.0, 6.0, 50).unwrap();
        let response = simulate(Topology::Lowpass, &ComponentValues::rc(r, c), &sweep).unwrap();

        assert_relative_eq!(response[0], 1.0, epsilon = 1e-6);
        for (f, m) in sweep.points().iter().zip(&response) {
            let wrc = 2.0 * PI * f * r * c;
            assert_relative_eq!(*m, 1.0 / (1.0 + wrc * wrc).sqrt(), max_relative = 1e-9);
        }
        // First-order roll-off reaches about 0.157 at 1 MHz
        assert_relative_eq!(response[49], 0.1572, epsilon = 1e-3);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let sweep = FrequencySweep::logspace(1.0, 6.0, 50).unwrap();
        let response = simulate(Topology::Highpass, &ComponentValues::rc(1e4, 1e-8), &sweep).unwrap();
        assert!(response[0] < 1e-3);
        assert_relative_eq!(response[49], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_unknown_topology_string() {
        let err = "notch".parse::<Topology>().unwrap_err();
        assert!(matches!(err, DesignError::InvalidTopology { ref name } if name == "notch"));
    }

    #[test]
    fn test_bandpass_without_inductance() {
        let sweep = FrequencySweep::default();
        assert!(matches!(
            simulate(Topology::Bandpass, &ComponentValues::rc(1e3, 1e-9), &sweep),
            Err(DesignError::MissingParameter { .. })
        ));
    }
}
