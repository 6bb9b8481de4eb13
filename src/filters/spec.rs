//! Filter component values and their netlists.

use std::fmt;

use super::Topology;
use crate::dsl::{CircuitAst, ComponentDef, ComponentType};
use crate::error::{DesignError, Result};

/// Component values supplied by a caller, before validation.
///
/// Only the values a topology needs are required; inductance is ignored
/// for topologies without an inductor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentValues {
    /// Resistance in ohms.
    pub resistance: Option<f64>,
    /// Inductance in henries.
    pub inductance: Option<f64>,
    /// Capacitance in farads.
    pub capacitance: Option<f64>,
}

impl ComponentValues {
    /// Values for an R/C topology.
    pub fn rc(resistance: f64, capacitance: f64) -> Self {
        Self {
            resistance: Some(resistance),
            inductance: None,
            capacitance: Some(capacitance),
        }
    }

    /// Values for an R/L/C topology.
    pub fn rlc(resistance: f64, inductance: f64, capacitance: f64) -> Self {
        Self {
            resistance: Some(resistance),
            inductance: Some(inductance),
            capacitance: Some(capacitance),
        }
    }
}

/// A validated passive filter.
///
/// R and C are always positive; L is positive for topologies with an
/// inductor and exactly zero otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub topology: Topology,
    pub resistance: f64,
    pub inductance: f64,
    pub capacitance: f64,
}

impl FilterSpec {
    /// Validate `values` against the needs of `topology`.
    pub fn new(topology: Topology, values: &ComponentValues) -> Result<Self> {
        let resistance = require(topology, "R", values.resistance)?;
        let capacitance = require(topology, "C", values.capacitance)?;
        let inductance = if topology.uses_inductor() {
            // A zero inductance means "not supplied"
            require(topology, "L", values.inductance.filter(|&l| l != 0.0))?
        } else {
            0.0
        };

        Ok(Self {
            topology,
            resistance,
            inductance,
            capacitance,
        })
    }

    /// Build from an `(R, L, C)` triple, the layout used by datasets and the model.
    pub fn from_params(topology: Topology, params: [f64; 3]) -> Result<Self> {
        let [r, l, c] = params;
        Self::new(topology, &ComponentValues::rlc(r, l, c))
    }

    /// `(R, L, C)` triple.
    pub fn params(&self) -> [f64; 3] {
        [self.resistance, self.inductance, self.capacitance]
    }

    /// Natural frequency in Hz: `1/(2πRC)` for first-order shapes,
    /// `1/(2π√(LC))` when an inductor is present.
    pub fn corner_frequency(&self) -> f64 {
        let tau = if self.topology.uses_inductor() {
            (self.inductance * self.capacitance).sqrt()
        } else {
            self.resistance * self.capacitance
        };
        1.0 / (2.0 * std::f64::consts::PI * tau)
    }

    /// Netlist of the filter driven by a unit AC source between `in` and ground.
    pub fn netlist(&self) -> CircuitAst {
        let mut ast = CircuitAst::new().with_ports("in", "out");
        ast.push(ComponentDef::ac_source("VIN", "in", "0", 1.0));

        let (r, l, c) = (self.resistance, self.inductance, self.capacitance);
        match self.topology {
            Topology::Lowpass => {
                ast.push(ComponentDef::passive(ComponentType::Resistor, "R1", "in", "out", r));
                ast.push(ComponentDef::passive(ComponentType::Capacitor, "C1", "out", "0", c));
            }
            Topology::Highpass => {
                ast.push(ComponentDef::passive(ComponentType::Capacitor, "C1", "in", "out", c));
                ast.push(ComponentDef::passive(ComponentType::Resistor, "R1", "out", "0", r));
            }
            Topology::Bandpass => {
                ast.push(ComponentDef::passive(ComponentType::Resistor, "R1", "in", "n1", r));
                ast.push(ComponentDef::passive(ComponentType::Inductor, "L1", "n1", "out", l));
                ast.push(ComponentDef::passive(ComponentType::Capacitor, "C1", "out", "0", c));
            }
        }
        ast
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: R = {:.4e} ohm, L = {:.4e} H, C = {:.4e} F",
            self.topology, self.resistance, self.inductance, self.capacitance
        )
    }
}

fn missing(topology: Topology, param: &str) -> DesignError {
    DesignError::MissingParameter {
        topology: topology.to_string(),
        param: param.to_string(),
    }
}

fn require(topology: Topology, param: &str, value: Option<f64>) -> Result<f64> {
    let value = value.ok_or_else(|| missing(topology, param))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(DesignError::invalid_parameter(
            topology.name(),
            param,
            format!("must be finite and positive, got {}", value),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl;

    #[test]
    fn test_inductance_forced_to_zero() {
        let spec = FilterSpec::new(Topology::Lowpass, &ComponentValues::rlc(1e3, 5e-4, 1e-9)).unwrap();
        assert_eq!(spec.params(), [1e3, 0.0, 1e-9]);
    }

    #[test]
    fn test_bandpass_requires_inductance() {
        for values in [ComponentValues::rc(1e3, 1e-9), ComponentValues::rlc(1e3, 0.0, 1e-9)] {
            let err = FilterSpec::new(Topology::Bandpass, &values).unwrap_err();
            assert!(matches!(err, DesignError::MissingParameter { ref param, .. } if param == "L"));
        }
    }

    #[test]
    fn test_missing_resistance() {
        let values = ComponentValues {
            capacitance: Some(1e-9),
            ..Default::default()
        };
        assert!(matches!(
            FilterSpec::new(Topology::Highpass, &values),
            Err(DesignError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        assert!(matches!(
            FilterSpec::new(Topology::Lowpass, &ComponentValues::rc(-1.0, 1e-9)),
            Err(DesignError::InvalidParameter { .. })
        ));
        assert!(FilterSpec::new(Topology::Lowpass, &ComponentValues::rc(1e3, f64::NAN)).is_err());
        assert!(FilterSpec::new(Topology::Bandpass, &ComponentValues::rlc(1e3, -1e-3, 1e-9)).is_err());
    }

    #[test]
    fn test_netlist_shapes() {
        let spec = FilterSpec::new(Topology::Bandpass, &ComponentValues::rlc(1e3, 1e-3, 1e-9)).unwrap();
        let ast = spec.netlist();
        let names: Vec<&str> = ast.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["VIN", "R1", "L1", "C1"]);
        assert_eq!(ast.components[2].nodes, ["n1", "out"]);

        // Rendered text is a valid netlist
        let reparsed = dsl::parse(&ast.to_string()).unwrap();
        assert_eq!(reparsed.components.len(), 4);
    }
}
