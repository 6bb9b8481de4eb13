//! Passive filter topologies and their frequency responses.
//!
//! A [`FilterSpec`] is a validated topology plus component values. Its
//! netlist is simulated by a [`FrequencyResponse`] backend; [`MnaBackend`]
//! runs the crate's own AC solver.

mod response;
mod spec;
mod topology;

pub use response::{simulate, FrequencyResponse, MnaBackend};
pub use spec::{ComponentValues, FilterSpec};
pub use topology::Topology;
