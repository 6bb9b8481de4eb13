//! Abstract Syntax Tree types for the netlist language.

use std::collections::HashMap;
use std::fmt;

/// Complete AST representation of a parsed netlist.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitAst {
    /// All component instances
    pub components: Vec<ComponentDef>,
    /// Input node name
    pub input_node: Option<String>,
    /// Output node name
    pub output_node: Option<String>,
    /// All referenced node names (including implicit ones)
    pub nodes: Vec<String>,
}

impl CircuitAst {
    /// Create a new empty circuit AST.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            input_node: None,
            output_node: None,
            nodes: Vec::new(),
        }
    }

    /// Set the input and output nodes.
    pub fn with_ports(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.input_node = Some(input.into());
        self.output_node = Some(output.into());
        self
    }

    /// Append a component, registering any node it introduces.
    pub fn push(&mut self, component: ComponentDef) {
        for node in &component.nodes {
            if node != "0" && !self.nodes.contains(node) {
                self.nodes.push(node.clone());
            }
        }
        self.components.push(component);
    }
}

impl Default for CircuitAst {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CircuitAst {
    /// Render the AST back into netlist text that [`super::parse`] accepts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(input) = &self.input_node {
            writeln!(f, ".input {}", input)?;
        }
        if let Some(output) = &self.output_node {
            writeln!(f, ".output {}", output)?;
        }
        for component in &self.components {
            writeln!(f, "{}", component)?;
        }
        Ok(())
    }
}

/// A component definition from the netlist.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDef {
    /// Component type (R, C, L, V, I)
    pub component_type: ComponentType,
    /// Unique component name
    pub name: String,
    /// Connected node names
    pub nodes: Vec<String>,
    /// Component value (resistance, capacitance, DC level, ...)
    pub value: Option<f64>,
    /// Additional parameters (`ac` magnitude for sources)
    pub params: HashMap<String, f64>,
    /// Source line number for error reporting
    pub line: usize,
}

impl ComponentDef {
    /// Create a two-terminal passive element.
    pub fn passive(
        component_type: ComponentType,
        name: impl Into<String>,
        n1: impl Into<String>,
        n2: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            component_type,
            name: name.into(),
            nodes: vec![n1.into(), n2.into()],
            value: Some(value),
            params: HashMap::new(),
            line: 0,
        }
    }

    /// Create a voltage source carrying a small-signal AC magnitude.
    pub fn ac_source(
        name: impl Into<String>,
        n_pos: impl Into<String>,
        n_neg: impl Into<String>,
        magnitude: f64,
    ) -> Self {
        let mut params = HashMap::new();
        params.insert("ac".to_string(), magnitude);
        Self {
            component_type: ComponentType::VoltageSource,
            name: name.into(),
            nodes: vec![n_pos.into(), n_neg.into()],
            value: None,
            params,
            line: 0,
        }
    }

    /// AC magnitude of a source, if one was given.
    pub fn ac_magnitude(&self) -> Option<f64> {
        self.params.get("ac").copied()
    }
}

impl fmt::Display for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for node in &self.nodes {
            write!(f, " {}", node)?;
        }
        match self.component_type {
            ComponentType::VoltageSource | ComponentType::CurrentSource => {
                if let Some(dc) = self.value {
                    write!(f, " DC {:e}", dc)?;
                }
                if let Some(ac) = self.ac_magnitude() {
                    write!(f, " AC {:e}", ac)?;
                }
            }
            _ => {
                if let Some(value) = self.value {
                    write!(f, " {:e}", value)?;
                }
            }
        }
        Ok(())
    }
}

/// Component types supported by the netlist language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    /// Resistor
    Resistor,
    /// Capacitor
    Capacitor,
    /// Inductor
    Inductor,
    /// Voltage Source
    VoltageSource,
    /// Current Source
    CurrentSource,
}

impl ComponentType {
    /// Parse a component type from its name prefix.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix.to_ascii_uppercase() {
            'R' => Some(Self::Resistor),
            'C' => Some(Self::Capacitor),
            'L' => Some(Self::Inductor),
            'V' => Some(Self::VoltageSource),
            'I' => Some(Self::CurrentSource),
            _ => None,
        }
    }

    /// Every supported element is a two-terminal device.
    pub const TERMINALS: usize = 2;

    /// Whether this component is an independent source.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::VoltageSource | Self::CurrentSource)
    }
}
