//! AC circuit solver based on Modified Nodal Analysis.
//!
//! ## Modified Nodal Analysis
//!
//! For every frequency point MNA assembles a complex system `Y(jω) x = z`:
//! - x contains node voltage phasors and branch current phasors
//! - Y is the admittance/coefficient matrix
//! - z is the excitation vector
//!
//! The matrix structure is:
//! ```text
//! [ G+jωC   B  ] [ v ]   [ i ]
//! [   C    -Z  ] [ j ] = [ e ]
//! ```
//!
//! where:
//! - G+jωC holds resistor conductances and capacitor admittances
//! - B, C connect branch elements (voltage sources, inductors) to nodes
//! - Z is diagonal: `jωL` for inductors, 0 for ideal voltage sources
//! - i is the sum of AC current sources into each node
//! - e holds the AC magnitudes of the voltage sources

mod ac;
pub mod backend;
mod mna;
mod sweep;

pub use ac::AcAnalysis;
pub use backend::ensure_available;
pub use mna::{stamp_components, ComplexMna, PIVOT_TOLERANCE};
pub use sweep::{FrequencySweep, Spacing, DEFAULT_POINTS, DEFAULT_START_HZ, DEFAULT_STOP_HZ};
