//! Adam optimizer.

use super::layers::ParamGroup;
use crate::error::{DesignError, Result};

pub const DEFAULT_BETA1: f32 = 0.9;
pub const DEFAULT_BETA2: f32 = 0.999;
pub const DEFAULT_EPSILON: f32 = 1e-8;

/// Adam with one pair of moment buffers per parameter group.
///
/// Buffers are sized on the first step; later steps must present the same
/// groups in the same order.
#[derive(Debug)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    beta1_t: f32,
    beta2_t: f32,
    epsilon: f32,
    moments: Vec<(Box<[f32]>, Box<[f32]>)>,
}

impl Adam {
    /// Creates a new `Adam` optimizer with the usual hyperparameters.
    pub fn new(learning_rate: f32) -> Self {
        Self::with_hyperparameters(learning_rate, DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_EPSILON)
    }

    pub fn with_hyperparameters(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            beta1_t: 1.,
            beta2_t: 1.,
            epsilon,
            moments: Vec::new(),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Apply one update to every group from its stored gradient.
    pub fn step(&mut self, groups: Vec<ParamGroup<'_>>) -> Result<()> {
        if self.moments.is_empty() {
            self.moments = groups
                .iter()
                .map(|g| {
                    let zeros = vec![0.; g.values.len()].into_boxed_slice();
                    (zeros.clone(), zeros)
                })
                .collect();
        }
        if groups.len() != self.moments.len() {
            return Err(DesignError::dimension_mismatch("optimizer parameter groups", self.moments.len(), groups.len()));
        }

        let Self {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            ..
        } = *self;

        self.beta1_t *= b1;
        self.beta2_t *= b2;

        let bc1 = 1. - self.beta1_t;
        let bc2 = 1. - self.beta2_t;
        let step_size = lr * (bc2.sqrt() / bc1);

        for (mut group, (v, s)) in groups.into_iter().zip(self.moments.iter_mut()) {
            if group.values.len() != v.len() || group.grad.len() != v.len() {
                return Err(DesignError::dimension_mismatch("optimizer parameter group", v.len(), group.values.len()));
            }

            group
                .values
                .iter_mut()
                .zip(group.grad.iter())
                .zip(v.iter_mut())
                .zip(s.iter_mut())
                .for_each(|(((p, g), v), s)| {
                    *v = b1 * *v + (1. - b1) * g;
                    *s = b2 * *s + (1. - b2) * g.powi(2);
                    *p -= step_size * *v / (s.sqrt() + eps);
                });
        }

        Ok(())
    }
}
