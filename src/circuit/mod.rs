//! Circuit graph representation and validation.
//!
//! This module turns a parsed netlist into the numbered form the AC solver
//! needs: every non-ground node gets a voltage unknown and every voltage
//! source or inductor gets a branch-current unknown.

mod graph;
mod types;
mod validate;

pub use graph::Circuit;
pub use types::*;
pub use validate::validate_circuit;
