//! Linear passive components: Resistor, Capacitor, Inductor.
//!
//! In small-signal AC analysis every passive element reduces to a complex
//! admittance (or, for inductors, a branch impedance) evaluated at the
//! angular frequency `omega = 2*pi*f`.

use num_complex::Complex64;

use crate::circuit::{BranchId, ComponentId, NodeId};

/// A resistor component. The resistance is strictly positive.
#[derive(Debug, Clone)]
pub struct Resistor {
    pub id: ComponentId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(id: ComponentId, name: String, nodes: [NodeId; 2], resistance: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            resistance,
        }
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }
}

/// A capacitor component: Y = jωC.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub id: ComponentId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub capacitance: f64,
}

impl Capacitor {
    /// Create a new capacitor.
    pub fn new(id: ComponentId, name: String, nodes: [NodeId; 2], capacitance: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            capacitance,
        }
    }

    /// Admittance at angular frequency `omega`.
    pub fn admittance(&self, omega: f64) -> Complex64 {
        Complex64::new(0.0, omega * self.capacitance)
    }
}

/// An inductor component.
///
/// Inductors get their own branch-current unknown so that `L = 0` (a short)
/// and `omega = 0` stay solvable: the branch row enforces
/// `V+ - V- - jωL * I = 0`.
#[derive(Debug, Clone)]
pub struct Inductor {
    pub id: ComponentId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub inductance: f64,
    pub branch: BranchId,
}

impl Inductor {
    /// Create a new inductor.
    pub fn new(
        id: ComponentId,
        name: String,
        nodes: [NodeId; 2],
        inductance: f64,
        branch: BranchId,
    ) -> Self {
        Self {
            id,
            name,
            nodes,
            inductance,
            branch,
        }
    }

    /// Impedance at angular frequency `omega`.
    pub fn impedance(&self, omega: f64) -> Complex64 {
        Complex64::new(0.0, omega * self.inductance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_resistor_conductance() {
        let r = Resistor::new(ComponentId(0), "R1".to_string(), [NodeId(1), NodeId(0)], 1000.0);
        assert_relative_eq!(r.conductance(), 0.001);
    }

    #[test]
    fn test_capacitor_admittance() {
        let c = Capacitor::new(ComponentId(0), "C1".to_string(), [NodeId(1), NodeId(0)], 1e-6);
        let y = c.admittance(2.0 * PI * 1000.0);
        assert_eq!(y.re, 0.0);
        // |Y| = 2*pi*1kHz*1uF
        assert_relative_eq!(y.im, 6.283185307179586e-3, max_relative = 1e-12);
    }

    #[test]
    fn test_inductor_impedance() {
        let l = Inductor::new(
            ComponentId(0),
            "L1".to_string(),
            [NodeId(1), NodeId(2)],
            1e-3,
            BranchId(0),
        );
        let z = l.impedance(2.0 * PI * 1000.0);
        assert_relative_eq!(z.im, 6.283185307179586, max_relative = 1e-12);
    }
}
