//! Layer stacks.

use ndarray::{Array2, ArrayView2, ArrayViewD};

use super::layers::{Layer, ParamGroup};
use super::Mode;

/// A sequential model: information flows forward when computing an output
/// and backward when computing the gradients of its layers.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, mode: Mode) -> Array2<f32> {
        let mut out = x.to_owned();
        for layer in &mut self.layers {
            out = layer.forward(out.view(), mode);
        }
        out
    }

    /// Backpropagate `d = dL/dy` through every layer, returning `dL/dx`.
    pub fn backward(&mut self, d: ArrayView2<f32>) -> Array2<f32> {
        let mut d = d.to_owned();
        for layer in self.layers.iter_mut().rev() {
            d = layer.backward(d.view());
        }
        d
    }

    pub fn param_groups(&mut self) -> Vec<ParamGroup<'_>> {
        self.layers.iter_mut().flat_map(|layer| layer.param_groups()).collect()
    }

    pub fn param_views(&self) -> Vec<ArrayViewD<'_, f32>> {
        self.layers.iter().flat_map(|layer| layer.param_views()).collect()
    }

    /// Total number of trainable scalars.
    pub fn size(&self) -> usize {
        self.param_views().iter().map(|p| p.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layers::{Dense, Softplus};
    use ndarray::{array, Array2};
    use rand::{rngs::StdRng, SeedableRng};

    fn net() -> Sequential {
        let mut rng = StdRng::seed_from_u64(11);
        Sequential::new([
            Layer::Dense(Dense::new(3, 4, &mut rng)),
            Layer::Softplus(Softplus::default()),
            Layer::Dense(Dense::new(4, 2, &mut rng)),
        ])
    }

    /// Weighted sum of the outputs, so `dL/dy` is the weight matrix.
    fn objective(net: &mut Sequential, x: &Array2<f32>, c: &Array2<f32>) -> f32 {
        (net.forward(x.view(), Mode::Eval) * c).sum()
    }

    #[test]
    fn test_size() {
        assert_eq!(net().size(), 3 * 4 + 4 + 4 * 2 + 2);
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let mut net = net();
        let x = array![[0.3, -0.7, 1.1], [-0.2, 0.5, 0.9]];
        let c = array![[1.0, -0.5], [0.25, 2.0]];

        net.forward(x.view(), Mode::Eval);
        net.backward(c.view());
        let analytic: Vec<Vec<f32>> = net
            .param_groups()
            .into_iter()
            .map(|g| g.grad.iter().copied().collect())
            .collect();

        let h = 1e-2;
        for (group, grads) in analytic.iter().enumerate() {
            for (k, &grad) in grads.iter().enumerate() {
                let nudge = |net: &mut Sequential, delta: f32| {
                    if let Some(v) = net.param_groups()[group].values.iter_mut().nth(k) {
                        *v += delta;
                    }
                };

                nudge(&mut net, h);
                let plus = objective(&mut net, &x, &c);
                nudge(&mut net, -2.0 * h);
                let minus = objective(&mut net, &x, &c);
                nudge(&mut net, h);

                let numeric = (plus - minus) / (2.0 * h);
                assert!(
                    (numeric - grad).abs() <= 1e-3 + 1e-2 * grad.abs(),
                    "group {} element {}: numeric {} vs analytic {}",
                    group,
                    k,
                    numeric,
                    grad
                );
            }
        }
    }
}
