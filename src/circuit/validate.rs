//! Circuit validation.

use crate::error::{DesignError, Result};

use super::Circuit;

/// Validate a circuit for AC analysis.
///
/// Checks:
/// - Input and output nodes are not ground
/// - The circuit has components
/// - Exactly one source carries an AC magnitude
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    if circuit.input_node.is_ground() {
        return Err(DesignError::InvalidCircuit {
            message: "Input node cannot be ground".to_string(),
        });
    }

    if circuit.output_node.is_ground() {
        return Err(DesignError::InvalidCircuit {
            message: "Output node cannot be ground".to_string(),
        });
    }

    if circuit.components.is_empty() {
        return Err(DesignError::InvalidCircuit {
            message: "Circuit has no components".to_string(),
        });
    }

    let excitations: Vec<&str> = circuit
        .components
        .iter()
        .filter(|c| c.is_excitation())
        .map(|c| c.name())
        .collect();

    match excitations.len() {
        0 => Err(DesignError::InvalidCircuit {
            message: "no source carries an AC magnitude".to_string(),
        }),
        1 => Ok(()),
        _ => Err(DesignError::InvalidCircuit {
            message: format!("multiple AC sources: {}", excitations.join(", ")),
        }),
    }
}
