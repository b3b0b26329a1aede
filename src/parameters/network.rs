use ndarray::{Array1, ArrayView1};
use rand::{SeedableRng, rngs::StdRng};

use super::{Gradients, Parameters};
use crate::{
    config::NetworkConfig,
    error::{Result, RnnErr},
    optimization::{Adagrad, Optimizer},
};

/// Everything a training run mutates: weights, the carried hidden state and the Adagrad memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    config: NetworkConfig,
    params: Parameters,
    hidden: Array1<f32>,
    optimizer: Adagrad,
}

impl Network {
    /// Creates a new `Network` with random weights and zeroed biases, hidden state and memory.
    ///
    /// # Arguments
    /// * `config` - The network's configuration.
    /// * `seed` - Seed for the weight initialization, `None` draws one from the OS.
    ///
    /// # Returns
    /// An error if the configuration is invalid.
    pub fn new(config: NetworkConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let params = Parameters::random(&config, rng)?;
        Ok(Self {
            hidden: Array1::zeros(config.hidden_size),
            optimizer: Adagrad::new(&config),
            params,
            config,
        })
    }

    /// Rebuilds a network from its parts, as stored in a checkpoint.
    ///
    /// # Returns
    /// An error if the configuration is invalid or any part has the wrong shape.
    pub fn from_parts(
        config: NetworkConfig,
        params: Parameters,
        hidden: Array1<f32>,
        memory: Parameters,
    ) -> Result<Self> {
        config.validate()?;

        let expected = Parameters::zeros(&config);
        if !params.same_shape(&expected) {
            return Err(RnnErr::SizeMismatch {
                what: "parameters",
                got: params.len(),
                expected: expected.len(),
            });
        }

        if hidden.len() != config.hidden_size {
            return Err(RnnErr::SizeMismatch {
                what: "hidden state",
                got: hidden.len(),
                expected: config.hidden_size,
            });
        }

        Ok(Self {
            optimizer: Adagrad::with_memory(&config, memory)?,
            params,
            hidden,
            config,
        })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn hidden(&self) -> ArrayView1<'_, f32> {
        self.hidden.view()
    }

    pub fn optimizer(&self) -> &Adagrad {
        &self.optimizer
    }

    pub fn reset_hidden(&mut self) {
        self.hidden.fill(0.);
    }

    /// Applies the Adagrad update and carries `hidden` over to the next window.
    ///
    /// Nothing is modified when an error is returned.
    ///
    /// # Arguments
    /// * `hidden` - The last hidden state of the window just processed.
    /// * `grads` - The clipped gradients of that window.
    pub fn commit(&mut self, hidden: Array1<f32>, grads: &Gradients) -> Result<()> {
        if hidden.len() != self.config.hidden_size {
            return Err(RnnErr::SizeMismatch {
                what: "hidden state",
                got: hidden.len(),
                expected: self.config.hidden_size,
            });
        }

        self.optimizer.update_params(grads, &mut self.params)?;
        self.hidden = hidden;
        Ok(())
    }
}
