//! Small-signal AC analysis.

use std::f64::consts::PI;

use log::debug;
use num_complex::Complex64;

use super::mna::{stamp_components, ComplexMna};
use crate::circuit::{validate_circuit, Circuit, NodeId};
use crate::error::{DesignError, Result};

/// Steady-state phasor solver for a linear circuit.
///
/// The circuit is validated once on construction; each call to [`run`]
/// re-assembles and factors the complex MNA system at every requested
/// frequency.
///
/// [`run`]: AcAnalysis::run
#[derive(Debug)]
pub struct AcAnalysis {
    circuit: Circuit,
    matrix: ComplexMna,
}

impl AcAnalysis {
    /// Prepare an analysis for a circuit with a single AC excitation.
    pub fn new(circuit: Circuit) -> Result<Self> {
        validate_circuit(&circuit)?;
        let matrix = ComplexMna::new(circuit.matrix_size());
        Ok(Self { circuit, matrix })
    }

    /// The circuit under analysis.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Output-node phasors, one per frequency, in the order given.
    pub fn run(&mut self, freqs: &[f64]) -> Result<Vec<Complex64>> {
        let output = self.circuit.output_node;
        freqs.iter().map(|&f| self.solve_at(f, output)).collect()
    }

    /// Output-node magnitudes, one per frequency.
    pub fn magnitudes(&mut self, freqs: &[f64]) -> Result<Vec<f64>> {
        Ok(self.run(freqs)?.iter().map(|v| v.norm()).collect())
    }

    fn solve_at(&mut self, frequency: f64, node: NodeId) -> Result<Complex64> {
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(DesignError::simulation_failure(frequency, "frequency must be finite and non-negative"));
        }

        let omega = 2.0 * PI * frequency;
        self.matrix.clear();
        stamp_components(&self.circuit, &mut self.matrix, omega);
        self.matrix.factor().map_err(|e| DesignError::simulation_failure(frequency, e.to_string()))?;
        self.matrix.solve();

        let v = self.matrix.node_voltage(&self.circuit, node);
        if !v.re.is_finite() || !v.im.is_finite() {
            return Err(DesignError::simulation_failure(frequency, "non-finite node voltage"));
        }
        debug!("AC {:.3e} Hz: |V({})| = {:.6e}", frequency, self.circuit.node_name(node), v.norm());
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl;
    use approx::assert_relative_eq;

    fn analysis(netlist: &str) -> AcAnalysis {
        let ast = dsl::parse(netlist).unwrap();
        AcAnalysis::new(Circuit::from_ast(&ast).unwrap()).unwrap()
    }

    #[test]
    fn test_voltage_divider() {
        let mut ac = analysis(".input in\n.output out\nVIN in 0 AC 1\nR1 in out 1k\nR2 out 0 1k");
        let mags = ac.magnitudes(&[10.0, 1e3, 1e6]).unwrap();
        for m in mags {
            assert_relative_eq!(m, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rc_lowpass_phasor() {
        let (r, c) = (1e3, 1e-6);
        let mut ac = analysis(".input in\n.output out\nVIN in 0 AC 1\nR1 in out 1k\nC1 out 0 1u");
        let fc = 1.0 / (2.0 * PI * r * c);
        let v = ac.run(&[fc]).unwrap()[0];

        // At the corner: |H| = 1/sqrt(2), phase = -45 degrees
        assert_relative_eq!(v.norm(), std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);
        assert_relative_eq!(v.arg().to_degrees(), -45.0, epsilon = 1e-6);
    }

    #[test]
    fn test_series_rlc_resonance() {
        // R-L-C ladder: at resonance the inductor and capacitor cancel
        let (l, c): (f64, f64) = (1e-3, 1e-6);
        let mut ac = analysis(".input in\n.output out\nVIN in 0 AC 1\nR1 in n1 100\nL1 n1 out 1m\nC1 out 0 1u");
        let f0 = 1.0 / (2.0 * PI * (l * c).sqrt());
        let mags = ac.magnitudes(&[f0 / 100.0, f0 * 100.0]).unwrap();
        assert_relative_eq!(mags[0], 1.0, epsilon = 1e-3);
        assert!(mags[1] < 1e-3);
    }

    #[test]
    fn test_current_source_into_resistor() {
        let mut ac = analysis(".input in\n.output in\nI1 0 in AC 2m\nR1 in 0 1k");
        let mags = ac.magnitudes(&[1e3]).unwrap();
        assert_relative_eq!(mags[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_floating_node_is_simulation_failure() {
        // C1 and C2 leave node "mid" floating at DC
        let mut ac = analysis(".input in\n.output out\nVIN in 0 AC 1\nR1 in out 1k\nC1 out mid 1n\nC2 mid x 1n");
        let err = ac.run(&[0.0]).unwrap_err();
        assert!(matches!(err, DesignError::SimulationFailure { frequency, .. } if frequency == 0.0));
    }

    #[test]
    fn test_rejects_negative_frequency() {
        let mut ac = analysis(".input in\n.output out\nVIN in 0 AC 1\nR1 in out 1k\nR2 out 0 1k");
        assert!(matches!(ac.run(&[-1.0]), Err(DesignError::SimulationFailure { .. })));
    }

    #[test]
    fn test_construction_validates_circuit() {
        let build = |netlist: &str| AcAnalysis::new(Circuit::from_ast(&dsl::parse(netlist).unwrap()).unwrap());
        assert!(matches!(
            build(".input in\n.output 0\nVIN in 0 AC 1\nR1 in 0 1k"),
            Err(DesignError::InvalidCircuit { .. })
        ));
        assert!(matches!(
            build(".input in\n.output out\nVIN in 0 DC 5\nR1 in out 1k\nR2 out 0 1k"),
            Err(DesignError::InvalidCircuit { .. })
        ));
    }
}
