//! Circuit graph structure.

use std::collections::HashMap;

use super::types::{BranchId, ComponentId, NodeId};
use crate::components::Component;
use crate::dsl::CircuitAst;
use crate::error::{DesignError, Result};

/// A complete circuit ready for AC analysis.
#[derive(Debug)]
pub struct Circuit {
    /// All components in the circuit
    pub components: Vec<Component>,

    /// Mapping from node names to node IDs
    pub node_map: HashMap<String, NodeId>,

    /// Reverse mapping from node IDs to names (for error messages)
    pub node_names: Vec<String>,

    /// Number of nodes (including ground)
    pub num_nodes: usize,

    /// Number of branch current variables (voltage sources, inductors)
    pub num_branches: usize,

    /// Input node ID (where the excitation is applied)
    pub input_node: NodeId,

    /// Output node ID (where the response is read)
    pub output_node: NodeId,
}

impl Circuit {
    /// Build a circuit from a parsed AST.
    pub fn from_ast(ast: &CircuitAst) -> Result<Self> {
        let mut node_map = HashMap::new();
        let mut node_names = vec!["0".to_string()];

        // Ground is always node 0
        node_map.insert("0".to_string(), NodeId::GROUND);
        node_map.insert("GND".to_string(), NodeId::GROUND);

        let declared = ast.nodes.iter();
        let referenced = ast.components.iter().flat_map(|c| c.nodes.iter());
        for name in declared.chain(referenced) {
            if !node_map.contains_key(name) {
                node_map.insert(name.clone(), NodeId(node_names.len()));
                node_names.push(name.clone());
            }
        }

        let num_nodes = node_names.len();

        let lookup = |name: &str| {
            node_map
                .get(name)
                .copied()
                .ok_or_else(|| DesignError::NodeNotFound { node: name.to_string() })
        };

        let input_node = lookup(ast.input_node.as_deref().ok_or(DesignError::MissingInput)?)?;
        let output_node = lookup(ast.output_node.as_deref().ok_or(DesignError::MissingOutput)?)?;

        let mut num_branches = 0usize;
        let components = ast
            .components
            .iter()
            .enumerate()
            .map(|(idx, def)| {
                let nodes = [lookup(&def.nodes[0])?, lookup(&def.nodes[1])?];
                Component::from_def(ComponentId(idx), def, nodes, &mut num_branches)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Circuit {
            components,
            node_map,
            node_names,
            num_nodes,
            num_branches,
            input_node,
            output_node,
        })
    }

    /// Get the total size of the MNA solution vector.
    pub fn matrix_size(&self) -> usize {
        // Nodes (excluding ground) + branch currents
        (self.num_nodes - 1) + self.num_branches
    }

    /// Matrix index of a node voltage; `None` for ground.
    pub fn node_index(&self, node: NodeId) -> Option<usize> {
        node.unknown()
    }

    /// Get the matrix index for a branch current.
    pub fn branch_index(&self, branch: BranchId) -> usize {
        (self.num_nodes - 1) + branch.0
    }

    /// Find a node ID by name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_map.get(name).copied()
    }

    /// Get the name of a node.
    pub fn node_name(&self, node: NodeId) -> &str {
        &self.node_names[node.0]
    }
}
