//! Index newtypes shared by the circuit and the solver.

/// A node of the netlist. Node 0 is ground and has no unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const GROUND: NodeId = NodeId(0);

    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }

    /// Position of this node's voltage among the MNA unknowns.
    pub fn unknown(&self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}

/// Position of a component in netlist order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub usize);

/// An extra current unknown, owned by a voltage source or an inductor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_has_no_unknown() {
        assert!(NodeId::GROUND.is_ground());
        assert_eq!(NodeId::GROUND.unknown(), None);
        assert_eq!(NodeId(3).unknown(), Some(2));
    }
}
