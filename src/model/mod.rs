//! Generative model: a variational autoencoder over filter responses.
//!
//! The network is small and trained on the CPU, so layers are implemented
//! directly on `ndarray` with analytic gradients instead of pulling in a
//! deep-learning framework.
//!
//! - [`layers`]: dense, activations, dropout
//! - [`Sequential`]: layer stacks
//! - [`Vae`]: encoder, latent heads, decoder and the VAE loss
//! - [`Adam`]: optimizer
//! - [`Checkpoint`]: weights plus the training sweep, as JSON

mod checkpoint;
pub mod layers;
mod optimizer;
mod sequential;
mod vae;

pub use checkpoint::{Checkpoint, FORMAT_VERSION};
pub use optimizer::Adam;
pub use sequential::Sequential;
pub use vae::{Architecture, LossBreakdown, Pass, Vae, VaeConfig, OUTPUT_DIM};

/// Whether stochastic layers are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Dropout on, latent noise sampled.
    Train,
    /// Dropout off, latent mean used.
    Eval,
}
