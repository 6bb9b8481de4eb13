//! Voltage and current sources.

use num_complex::Complex64;

use crate::circuit::{BranchId, ComponentId, NodeId};

/// A voltage source component.
///
/// Voltage sources require an extra row/column in the MNA matrix for the
/// branch current. In AC analysis the source enforces `V+ - V- = AC`; a
/// source without an AC magnitude is a small-signal short. Any `DC` level
/// stays in the netlist AST only, since it has no small-signal effect.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub id: ComponentId,
    pub name: String,
    pub nodes: [NodeId; 2], // [positive, negative]
    pub ac_magnitude: f64,
    pub branch: BranchId,
}

impl VoltageSource {
    /// Create a new voltage source.
    pub fn new(
        id: ComponentId,
        name: String,
        nodes: [NodeId; 2],
        ac_magnitude: f64,
        branch: BranchId,
    ) -> Self {
        Self {
            id,
            name,
            nodes,
            ac_magnitude,
            branch,
        }
    }

    /// Small-signal excitation phasor (zero phase).
    pub fn phasor(&self) -> Complex64 {
        Complex64::new(self.ac_magnitude, 0.0)
    }

    /// Whether this source drives the AC analysis.
    pub fn is_excitation(&self) -> bool {
        self.ac_magnitude != 0.0
    }
}

/// A current source component.
///
/// Current sources add directly to the RHS vector of the MNA equations;
/// without an AC magnitude they are open in the small-signal circuit.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    pub id: ComponentId,
    pub name: String,
    pub nodes: [NodeId; 2], // [positive, negative] - current flows from + to -
    pub ac_magnitude: f64,
}

impl CurrentSource {
    /// Create a new current source.
    pub fn new(id: ComponentId, name: String, nodes: [NodeId; 2], ac_magnitude: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            ac_magnitude,
        }
    }

    /// Small-signal excitation phasor (zero phase).
    pub fn phasor(&self) -> Complex64 {
        Complex64::new(self.ac_magnitude, 0.0)
    }

    /// Whether this source drives the AC analysis.
    pub fn is_excitation(&self) -> bool {
        self.ac_magnitude != 0.0
    }
}
