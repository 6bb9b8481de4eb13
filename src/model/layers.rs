//! Network layers with hand-written backpropagation.
//!
//! Every layer caches what it needs from its last forward pass, so a
//! `backward` call must follow the `forward` call it differentiates.

use ndarray::{linalg, prelude::*, ArrayViewD, ArrayViewMutD};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::Mode;

/// Trainable values of a layer next to their gradient.
pub struct ParamGroup<'a> {
    pub values: ArrayViewMutD<'a, f32>,
    pub grad: ArrayViewD<'a, f32>,
}

/// Fully connected layer `y = x W + b`.
#[derive(Debug, Clone)]
pub struct Dense {
    weights: Array2<f32>,
    bias: Array1<f32>,
    grad_weights: Array2<f32>,
    grad_bias: Array1<f32>,

    // Forward metadata
    x: Array2<f32>,
}

impl Dense {
    /// Create a layer with Xavier-uniform weights and zero biases.
    pub fn new<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f32).sqrt();
        let weights = Array2::from_shape_simple_fn((inputs, outputs), || rng.random_range(-limit..=limit));

        Self {
            weights,
            bias: Array1::zeros(outputs),
            grad_weights: Array2::zeros((inputs, outputs)),
            grad_bias: Array1::zeros(outputs),
            x: Array2::zeros((0, inputs)),
        }
    }

    /// `(inputs, outputs)`.
    pub fn dim(&self) -> (usize, usize) {
        self.weights.dim()
    }

    pub fn forward(&mut self, x: ArrayView2<f32>) -> Array2<f32> {
        self.x = x.to_owned();
        x.dot(&self.weights) + &self.bias
    }

    /// Store the parameter gradients for `d = dL/dy` and return `dL/dx`.
    pub fn backward(&mut self, d: ArrayView2<f32>) -> Array2<f32> {
        linalg::general_mat_mul(1.0, &self.x.t(), &d, 0.0, &mut self.grad_weights);
        self.grad_bias.assign(&d.sum_axis(Axis(0)));
        d.dot(&self.weights.t())
    }

    pub fn param_groups(&mut self) -> [ParamGroup<'_>; 2] {
        [
            ParamGroup {
                values: self.weights.view_mut().into_dyn(),
                grad: self.grad_weights.view().into_dyn(),
            },
            ParamGroup {
                values: self.bias.view_mut().into_dyn(),
                grad: self.grad_bias.view().into_dyn(),
            },
        ]
    }

    pub fn param_views(&self) -> [ArrayViewD<'_, f32>; 2] {
        [self.weights.view().into_dyn(), self.bias.view().into_dyn()]
    }
}

/// Rectified linear unit.
#[derive(Debug, Clone, Default)]
pub struct Relu {
    x: Array2<f32>,
}

impl Relu {
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Array2<f32> {
        self.x = x.to_owned();
        x.mapv(|v| v.max(0.0))
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Array2<f32> {
        let mut d = d.to_owned();
        d.zip_mut_with(&self.x, |d, &x| {
            if x <= 0.0 {
                *d = 0.0;
            }
        });
        d
    }
}

/// `ln(1 + e^x)`, a smooth non-negative activation.
#[derive(Debug, Clone, Default)]
pub struct Softplus {
    x: Array2<f32>,
}

impl Softplus {
    /// Overflow-free form: `max(x, 0) + ln(1 + e^-|x|)`.
    pub fn f(x: f32) -> f32 {
        x.max(0.0) + (-x.abs()).exp().ln_1p()
    }

    /// Derivative: the logistic sigmoid.
    pub fn df(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }

    pub fn forward(&mut self, x: ArrayView2<f32>) -> Array2<f32> {
        self.x = x.to_owned();
        x.mapv(Self::f)
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Array2<f32> {
        let mut d = d.to_owned();
        d.zip_mut_with(&self.x, |d, &x| *d *= Self::df(x));
        d
    }
}

/// Inverted dropout: active only in [`Mode::Train`].
#[derive(Debug, Clone)]
pub struct Dropout {
    p: f32,
    rng: StdRng,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    /// `p` is the probability of zeroing an activation.
    pub fn new(p: f32, seed: u64) -> Self {
        Self {
            p,
            rng: StdRng::seed_from_u64(seed),
            mask: None,
        }
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, mode: Mode) -> Array2<f32> {
        if mode == Mode::Eval || self.p <= 0.0 {
            self.mask = None;
            return x.to_owned();
        }

        let keep = 1.0 - self.p;
        let scale = 1.0 / keep;
        let rng = &mut self.rng;
        let mask = Array2::from_shape_simple_fn(x.raw_dim(), || {
            if rng.random::<f32>() < keep {
                scale
            } else {
                0.0
            }
        });
        let out = &x * &mask;
        self.mask = Some(mask);
        out
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Array2<f32> {
        match &self.mask {
            Some(mask) => &d * mask,
            None => d.to_owned(),
        }
    }
}

/// Any layer of a [`super::Sequential`].
#[derive(Debug, Clone)]
pub enum Layer {
    Dense(Dense),
    Relu(Relu),
    Softplus(Softplus),
    Dropout(Dropout),
}

impl Layer {
    pub fn forward(&mut self, x: ArrayView2<f32>, mode: Mode) -> Array2<f32> {
        match self {
            Layer::Dense(l) => l.forward(x),
            Layer::Relu(l) => l.forward(x),
            Layer::Softplus(l) => l.forward(x),
            Layer::Dropout(l) => l.forward(x, mode),
        }
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Layer::Dense(l) => l.backward(d),
            Layer::Relu(l) => l.backward(d),
            Layer::Softplus(l) => l.backward(d),
            Layer::Dropout(l) => l.backward(d),
        }
    }

    pub fn param_groups(&mut self) -> Vec<ParamGroup<'_>> {
        match self {
            Layer::Dense(l) => l.param_groups().into(),
            _ => Vec::new(),
        }
    }

    pub fn param_views(&self) -> Vec<ArrayViewD<'_, f32>> {
        match self {
            Layer::Dense(l) => l.param_views().into(),
            _ => Vec::new(),
        }
    }
}
