use ndarray::Zip;
use rayon::prelude::*;

use super::Optimizer;
use crate::{
    config::NetworkConfig,
    error::{Result, RnnErr},
    parameters::{Gradients, Parameters},
};

/// Adagrad, `mem += g²` and `p -= lr · g / sqrt(mem + eps)`, with one accumulator per parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Adagrad {
    learning_rate: f32,
    epsilon: f32,
    memory: Parameters,
}

impl Adagrad {
    /// Creates a new `Adagrad` optimizer with zeroed memory.
    ///
    /// # Arguments
    /// * `config` - The network's configuration, it gives the shapes and hyperparameters.
    ///
    /// # Returns
    /// A new `Adagrad` instance.
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            epsilon: config.adagrad_epsilon,
            memory: Parameters::zeros(config),
        }
    }

    /// Restores an optimizer from previously accumulated memory.
    ///
    /// # Returns
    /// A size mismatch error if `memory` doesn't have the configured shapes.
    pub fn with_memory(config: &NetworkConfig, memory: Parameters) -> Result<Self> {
        let adagrad = Self::new(config);
        if !adagrad.memory.same_shape(&memory) {
            return Err(RnnErr::SizeMismatch {
                what: "adagrad memory",
                got: memory.len(),
                expected: adagrad.memory.len(),
            });
        }

        Ok(Self { memory, ..adagrad })
    }

    /// The squared gradient sums accumulated so far.
    pub fn memory(&self) -> &Parameters {
        &self.memory
    }
}

impl Optimizer for Adagrad {
    fn update_params(&mut self, grad: &Gradients, params: &mut Parameters) -> Result<()> {
        if !grad.same_shape(params) || !self.memory.same_shape(params) {
            return Err(RnnErr::SizeMismatch {
                what: "gradients",
                got: grad.len(),
                expected: params.len(),
            });
        }

        let Self {
            learning_rate: lr,
            epsilon: eps,
            ..
        } = *self;

        params
            .views_mut()
            .into_par_iter()
            .zip(grad.views())
            .zip(self.memory.views_mut())
            .for_each(|((params, grad), memory)| {
                Zip::from(params)
                    .and(&grad)
                    .and(memory)
                    .for_each(|p, &g, m| {
                        *m += g * g;
                        *p += -lr * g / (*m + eps).sqrt();
                    });
            });

        Ok(())
    }
}
