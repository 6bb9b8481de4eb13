//! Variational autoencoder mapping responses to component values.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2, ArrayViewD};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::layers::{Dense, Dropout, Layer, ParamGroup, Relu, Softplus};
use super::{Mode, Sequential};
use crate::error::{DesignError, Result};

/// Width of the decoder output: (R, L, C).
pub const OUTPUT_DIM: usize = 3;

/// Network depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// Two dense layers on each side, no dropout.
    Shallow,
    /// Three hidden layers on each side with dropout.
    Deep,
}

impl Architecture {
    pub fn default_latent_dim(self) -> usize {
        match self {
            Architecture::Shallow => 16,
            Architecture::Deep => 32,
        }
    }

    pub fn default_hidden_dim(self) -> usize {
        match self {
            Architecture::Shallow => 128,
            Architecture::Deep => 256,
        }
    }

    pub fn default_dropout(self) -> f32 {
        match self {
            Architecture::Shallow => 0.0,
            Architecture::Deep => 0.1,
        }
    }
}

impl FromStr for Architecture {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "shallow" | "vae" => Ok(Architecture::Shallow),
            "deep" | "advanced" => Ok(Architecture::Deep),
            other => Err(DesignError::invalid_config(format!("unknown model type: {}", other))),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::Shallow => write!(f, "shallow"),
            Architecture::Deep => write!(f, "deep"),
        }
    }
}

/// Everything needed to rebuild a [`Vae`] with the same shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaeConfig {
    pub architecture: Architecture,
    /// Response length plus one topology slot.
    pub input_dim: usize,
    pub latent_dim: usize,
    pub hidden_dim: usize,
    pub dropout: f32,
    /// Seed for weight initialisation and sampling noise.
    pub seed: Option<u64>,
}

impl VaeConfig {
    /// Architecture defaults for a given input width.
    pub fn new(architecture: Architecture, input_dim: usize) -> Self {
        Self {
            architecture,
            input_dim,
            latent_dim: architecture.default_latent_dim(),
            hidden_dim: architecture.default_hidden_dim(),
            dropout: architecture.default_dropout(),
            seed: None,
        }
    }

    pub fn with_latent_dim(mut self, latent_dim: usize) -> Self {
        self.latent_dim = latent_dim;
        self
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_dim < 2 {
            return Err(DesignError::invalid_config(format!(
                "input dimension must cover at least one frequency and the topology index, got {}",
                self.input_dim
            )));
        }
        if self.latent_dim == 0 || self.hidden_dim == 0 {
            return Err(DesignError::invalid_config("latent and hidden dimensions must be positive"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(DesignError::invalid_config(format!(
                "dropout must lie in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}

/// Result of one forward pass, kept for the loss and the backward pass.
#[derive(Debug, Clone)]
pub struct Pass {
    /// Decoded (R, L, C), non-negative.
    pub recon: Array2<f32>,
    pub mu: Array2<f32>,
    pub logvar: Array2<f32>,
    /// Standard-normal noise used for the latent sample (zero in eval mode).
    pub eps: Array2<f32>,
}

/// Loss terms of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossBreakdown {
    pub total: f32,
    /// Mean squared error of the decoded values.
    pub recon: f32,
    /// KL divergence from the standard normal prior, averaged over the batch.
    pub kld: f32,
}

/// Encoder, latent heads and decoder.
#[derive(Debug, Clone)]
pub struct Vae {
    config: VaeConfig,
    encoder: Sequential,
    fc_mu: Dense,
    fc_logvar: Dense,
    decoder: Sequential,
    rng: StdRng,
}

impl Vae {
    /// Build a freshly initialised model.
    pub fn new(config: VaeConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let (input, hidden, latent) = (config.input_dim, config.hidden_dim, config.latent_dim);
        let p = config.dropout;
        let dense = |i: usize, o: usize, rng: &mut StdRng| Layer::Dense(Dense::new(i, o, rng));
        let relu = || Layer::Relu(Relu::default());

        let (encoder, decoder) = match config.architecture {
            Architecture::Shallow => (
                vec![dense(input, hidden, &mut rng), relu(), dense(hidden, hidden, &mut rng), relu()],
                vec![
                    dense(latent, hidden, &mut rng),
                    relu(),
                    dense(hidden, OUTPUT_DIM, &mut rng),
                    Layer::Softplus(Softplus::default()),
                ],
            ),
            Architecture::Deep => (
                vec![
                    dense(input, hidden, &mut rng),
                    relu(),
                    Layer::Dropout(Dropout::new(p, rng.random())),
                    dense(hidden, hidden, &mut rng),
                    relu(),
                    Layer::Dropout(Dropout::new(p, rng.random())),
                    dense(hidden, hidden, &mut rng),
                    relu(),
                ],
                vec![
                    dense(latent, hidden, &mut rng),
                    relu(),
                    dense(hidden, hidden, &mut rng),
                    relu(),
                    Layer::Dropout(Dropout::new(p, rng.random())),
                    dense(hidden, hidden, &mut rng),
                    relu(),
                    dense(hidden, OUTPUT_DIM, &mut rng),
                    Layer::Softplus(Softplus::default()),
                ],
            ),
        };

        let fc_mu = Dense::new(hidden, latent, &mut rng);
        let fc_logvar = Dense::new(hidden, latent, &mut rng);

        Ok(Self {
            config,
            encoder: Sequential::new(encoder),
            fc_mu,
            fc_logvar,
            decoder: Sequential::new(decoder),
            rng,
        })
    }

    pub fn config(&self) -> &VaeConfig {
        &self.config
    }

    /// Encode, sample and decode a batch of inputs.
    ///
    /// In [`Mode::Train`] the latent sample is `mu + exp(logvar/2) * eps`
    /// with `eps ~ N(0, 1)`; in [`Mode::Eval`] it is `mu`, so inference is
    /// deterministic.
    pub fn forward(&mut self, x: ArrayView2<f32>, mode: Mode) -> Result<Pass> {
        if x.ncols() != self.config.input_dim {
            return Err(DesignError::dimension_mismatch("model input width", self.config.input_dim, x.ncols()));
        }

        let shape = (x.nrows(), self.config.latent_dim);
        let eps = match mode {
            Mode::Train => {
                let rng = &mut self.rng;
                Array2::from_shape_simple_fn(shape, || rng.sample(StandardNormal))
            }
            Mode::Eval => Array2::zeros(shape),
        };
        Ok(self.forward_with_noise(x, eps, mode))
    }

    fn forward_with_noise(&mut self, x: ArrayView2<f32>, eps: Array2<f32>, mode: Mode) -> Pass {
        let h = self.encoder.forward(x, mode);
        let mu = self.fc_mu.forward(h.view());
        let logvar = self.fc_logvar.forward(h.view());

        let z = &mu + &(logvar.mapv(|lv| (0.5 * lv).exp()) * &eps);
        let recon = self.decoder.forward(z.view(), mode);

        Pass { recon, mu, logvar, eps }
    }

    /// Decode latent vectors into (R, L, C).
    pub fn decode(&mut self, z: ArrayView2<f32>) -> Result<Array2<f32>> {
        if z.ncols() != self.config.latent_dim {
            return Err(DesignError::dimension_mismatch("latent width", self.config.latent_dim, z.ncols()));
        }
        Ok(self.decoder.forward(z, Mode::Eval))
    }

    /// MSE reconstruction plus batch-averaged KL divergence.
    pub fn loss(&self, pass: &Pass, y: ArrayView2<f32>) -> LossBreakdown {
        let batch = pass.mu.nrows().max(1) as f32;
        let recon = (&pass.recon - &y).mapv(|e| e * e).mean().unwrap_or_default();
        let kld = -0.5
            * pass
                .mu
                .iter()
                .zip(pass.logvar.iter())
                .map(|(&m, &lv)| 1.0 + lv - m * m - lv.exp())
                .sum::<f32>()
            / batch;

        LossBreakdown {
            total: recon + kld,
            recon,
            kld,
        }
    }

    /// Fill every layer's gradient with `d loss / d param` for `pass`.
    ///
    /// `pass` must come from the latest `forward` call.
    pub fn backward(&mut self, pass: &Pass, y: ArrayView2<f32>) {
        let batch = pass.mu.nrows().max(1) as f32;
        let d_recon = (&pass.recon - &y) * (2.0 / pass.recon.len().max(1) as f32);
        let dz = self.decoder.backward(d_recon.view());

        let std = pass.logvar.mapv(|lv| (0.5 * lv).exp());
        let d_mu = &dz + &(&pass.mu / batch);
        let d_logvar = &dz * &pass.eps * &std * 0.5 + &pass.logvar.mapv(|lv| 0.5 * (lv.exp() - 1.0) / batch);

        let dh = self.fc_mu.backward(d_mu.view()) + self.fc_logvar.backward(d_logvar.view());
        self.encoder.backward(dh.view());
    }

    /// Trainable groups in a fixed order: encoder, mean head, log-variance
    /// head, decoder.
    pub fn param_groups(&mut self) -> Vec<ParamGroup<'_>> {
        let mut groups = self.encoder.param_groups();
        groups.extend(self.fc_mu.param_groups());
        groups.extend(self.fc_logvar.param_groups());
        groups.extend(self.decoder.param_groups());
        groups
    }

    fn param_views(&self) -> Vec<ArrayViewD<'_, f32>> {
        let mut views = self.encoder.param_views();
        views.extend(self.fc_mu.param_views());
        views.extend(self.fc_logvar.param_views());
        views.extend(self.decoder.param_views());
        views
    }

    /// Flattened copy of every parameter group, in [`Vae::param_groups`] order.
    pub fn weights(&self) -> Vec<Vec<f32>> {
        self.param_views().iter().map(|v| v.iter().copied().collect()).collect()
    }

    /// Overwrite all parameters from [`Vae::weights`] output.
    pub fn load_weights(&mut self, weights: &[Vec<f32>]) -> Result<()> {
        let mut groups = self.param_groups();
        if groups.len() != weights.len() {
            return Err(DesignError::dimension_mismatch("weight groups", groups.len(), weights.len()));
        }
        for (i, (group, values)) in groups.iter_mut().zip(weights).enumerate() {
            if group.values.len() != values.len() {
                return Err(DesignError::dimension_mismatch(
                    format!("weight group {}", i),
                    group.values.len(),
                    values.len(),
                ));
            }
            group.values.iter_mut().zip(values).for_each(|(p, v)| *p = *v);
        }
        Ok(())
    }

    /// Total number of trainable scalars.
    pub fn num_params(&self) -> usize {
        self.param_views().iter().map(|v| v.len()).sum()
    }
}
