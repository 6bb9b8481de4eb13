//! # Pedaler Design
//!
//! Inverse design of passive audio filters with a variational autoencoder.
//!
//! Given a target magnitude response sampled on a fixed frequency grid, a
//! trained model proposes the resistor, inductor and capacitor values of a
//! lowpass, highpass or bandpass filter that reproduces it.
//!
//! ## Architecture
//!
//! - [`dsl`] - Parser and renderer for the netlist language
//! - [`circuit`] - Node numbering and structural validation
//! - [`components`] - Linear elements and their AC stamps
//! - [`solver`] - Complex MNA assembly, LU solve and frequency sweeps
//! - [`filters`] - Filter topologies and the frequency-response contract
//! - [`dataset`] - Random filter sampling and NPZ persistence
//! - [`model`] - Dense layers, the VAE, Adam and checkpoints
//! - [`training`] - Training loop with early stopping and a CSV metrics log
//! - [`design`] - Checkpoint in, component values out
//!
//! ## Usage
//!
//! ```bash
//! pedaler-design generate --num-samples 1000 --output dataset.npz
//! pedaler-design train --dataset dataset.npz --output model.json
//! pedaler-design design --model model.json --filter-type lowpass --r 1k --c 10n
//! ```
//!
//! ## Simulation Method
//!
//! Each filter is described as a netlist and solved with Modified Nodal
//! Analysis in the frequency domain. At every frequency of the sweep:
//!
//! 1. Stamp the complex admittances `1/R`, `jωC` and the inductor branch rows
//! 2. Factor the system with partial pivoting and solve for node voltages
//! 3. Take the output phasor; its magnitude is the response (unit excitation)

pub mod circuit;
pub mod components;
pub mod dataset;
pub mod design;
pub mod dsl;
pub mod error;
pub mod filters;
pub mod logging;
pub mod model;
pub mod solver;
pub mod training;

// Re-export main types for convenience
pub use circuit::Circuit;
pub use dataset::{Dataset, DatasetGenerator, GeneratorConfig};
pub use design::{design, DesignReport, Designer};
pub use error::{DesignError, Result};
pub use filters::{simulate, ComponentValues, FilterSpec, Topology};
pub use model::{Architecture, Checkpoint, Vae, VaeConfig};
pub use solver::{AcAnalysis, FrequencySweep, Spacing};
pub use training::{StopReason, TrainConfig, TrainReport, Trainer};
