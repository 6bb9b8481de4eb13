//! Component models for AC circuit analysis.
//!
//! This module provides models for the supported circuit elements:
//! - Linear: Resistor, Capacitor, Inductor
//! - Sources: Voltage Source, Current Source
//!
//! Each component is stamped into the complex MNA matrix by the solver.

mod linear;
mod sources;

pub use linear::{Capacitor, Inductor, Resistor};
pub use sources::{CurrentSource, VoltageSource};

use crate::circuit::{BranchId, ComponentId, NodeId};
use crate::dsl::{ComponentDef, ComponentType};
use crate::error::{DesignError, Result};

/// A circuit component.
#[derive(Debug, Clone)]
pub enum Component {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
}

impl Component {
    /// Create a component from a netlist definition.
    pub fn from_def(
        id: ComponentId,
        def: &ComponentDef,
        nodes: [NodeId; 2],
        branch_counter: &mut usize,
    ) -> Result<Self> {
        let name = def.name.clone();
        let required = |what: &str| -> Result<f64> {
            let value = def.value.ok_or_else(|| {
                DesignError::invalid_component(&def.name, def.line, format!("{} requires a value", what))
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(DesignError::invalid_parameter(
                    &def.name,
                    "value",
                    format!("{} value must be finite and non-negative, got {}", what, value),
                ));
            }
            Ok(value)
        };

        let component = match def.component_type {
            ComponentType::Resistor => {
                let value = required("resistor")?;
                if value == 0.0 {
                    return Err(DesignError::invalid_parameter(
                        &def.name,
                        "value",
                        "resistor value must be positive, got 0",
                    ));
                }
                Component::Resistor(Resistor::new(id, name, nodes, value))
            }

            ComponentType::Capacitor => {
                Component::Capacitor(Capacitor::new(id, name, nodes, required("capacitor")?))
            }

            ComponentType::Inductor => {
                let value = required("inductor")?;
                Component::Inductor(Inductor::new(id, name, nodes, value, next_branch(branch_counter)))
            }

            ComponentType::VoltageSource => Component::VoltageSource(VoltageSource::new(
                id,
                name,
                nodes,
                def.ac_magnitude().unwrap_or(0.0),
                next_branch(branch_counter),
            )),

            ComponentType::CurrentSource => Component::CurrentSource(CurrentSource::new(
                id,
                name,
                nodes,
                def.ac_magnitude().unwrap_or(0.0),
            )),
        };

        Ok(component)
    }

    /// Get the component ID.
    pub fn id(&self) -> ComponentId {
        match self {
            Component::Resistor(r) => r.id,
            Component::Capacitor(c) => c.id,
            Component::Inductor(l) => l.id,
            Component::VoltageSource(v) => v.id,
            Component::CurrentSource(i) => i.id,
        }
    }

    /// Get the component name.
    pub fn name(&self) -> &str {
        match self {
            Component::Resistor(r) => &r.name,
            Component::Capacitor(c) => &c.name,
            Component::Inductor(l) => &l.name,
            Component::VoltageSource(v) => &v.name,
            Component::CurrentSource(i) => &i.name,
        }
    }

    /// Get the terminals of the component.
    pub fn nodes(&self) -> [NodeId; 2] {
        match self {
            Component::Resistor(r) => r.nodes,
            Component::Capacitor(c) => c.nodes,
            Component::Inductor(l) => l.nodes,
            Component::VoltageSource(v) => v.nodes,
            Component::CurrentSource(i) => i.nodes,
        }
    }

    /// Check if this component injects the AC excitation.
    pub fn is_excitation(&self) -> bool {
        match self {
            Component::VoltageSource(v) => v.is_excitation(),
            Component::CurrentSource(i) => i.is_excitation(),
            _ => false,
        }
    }
}

fn next_branch(counter: &mut usize) -> BranchId {
    let branch = BranchId(*counter);
    *counter += 1;
    branch
}
