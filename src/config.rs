use std::{env, str::FromStr};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, RnnErr},
    sampling::Policy,
};

pub const DEFAULT_HIDDEN_SIZE: usize = 100;
pub const DEFAULT_WINDOW_SIZE: usize = 25;
pub const DEFAULT_LEARNING_RATE: f32 = 1e-1;
pub const DEFAULT_ADAGRAD_EPSILON: f32 = 1e-8;
pub const DEFAULT_WEIGHT_INIT_SCALE: f32 = 0.01;

/// The distribution the weight matrices are drawn from at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitDistribution {
    /// Normal with mean 0 and standard deviation `weight_init_scale`.
    #[default]
    Normal,
    /// Uniform in `[-weight_init_scale, weight_init_scale)`.
    Uniform,
}

/// Immutable shape and hyperparameters of a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden_size: usize,
    pub window_size: usize,
    pub learning_rate: f32,
    pub adagrad_epsilon: f32,
    pub weight_init_scale: f32,
    #[serde(default)]
    pub init: InitDistribution,
}

impl NetworkConfig {
    /// Creates a new `NetworkConfig` with the default hidden size, window and hyperparameters.
    ///
    /// # Arguments
    /// * `input_size` - The length of the one-hot input vectors.
    /// * `output_size` - The length of the output probability vectors.
    ///
    /// # Returns
    /// A new `NetworkConfig` instance.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            output_size,
            hidden_size: DEFAULT_HIDDEN_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            adagrad_epsilon: DEFAULT_ADAGRAD_EPSILON,
            weight_init_scale: DEFAULT_WEIGHT_INIT_SCALE,
            init: InitDistribution::default(),
        }
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_adagrad_epsilon(mut self, adagrad_epsilon: f32) -> Self {
        self.adagrad_epsilon = adagrad_epsilon;
        self
    }

    pub fn with_weight_init(mut self, init: InitDistribution, scale: f32) -> Self {
        self.init = init;
        self.weight_init_scale = scale;
        self
    }

    /// Checks every field describes a usable network.
    ///
    /// # Returns
    /// An `InvalidConfig` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("input_size", self.input_size),
            ("output_size", self.output_size),
            ("hidden_size", self.hidden_size),
            ("window_size", self.window_size),
        ];

        if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
            return Err(RnnErr::InvalidConfig(format!("{name} must be positive")));
        }

        if !self.learning_rate.is_finite() || self.learning_rate < 0. {
            return Err(RnnErr::InvalidConfig(format!(
                "learning_rate must be finite and non negative, got {}",
                self.learning_rate
            )));
        }

        if !self.adagrad_epsilon.is_finite() || self.adagrad_epsilon <= 0. {
            return Err(RnnErr::InvalidConfig(format!(
                "adagrad_epsilon must be finite and positive, got {}",
                self.adagrad_epsilon
            )));
        }

        if !self.weight_init_scale.is_finite() || self.weight_init_scale < 0. {
            return Err(RnnErr::InvalidConfig(format!(
                "weight_init_scale must be finite and non negative, got {}",
                self.weight_init_scale
            )));
        }

        Ok(())
    }
}

/// Settings of a command line run, read once from the environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub hidden_size: usize,
    pub window_size: usize,
    pub learning_rate: f32,
    pub adagrad_epsilon: f32,
    pub weight_init_scale: f32,
    pub epochs: usize,
    pub sample_size: usize,
    pub sample_frequency: usize,
    pub choice: Policy,
    pub sample_start: String,
    /// Printed samples stop after the first generated symbol matching it.
    pub sample_end: Option<Regex>,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            hidden_size: DEFAULT_HIDDEN_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            adagrad_epsilon: DEFAULT_ADAGRAD_EPSILON,
            weight_init_scale: DEFAULT_WEIGHT_INIT_SCALE,
            epochs: 100,
            sample_size: 100,
            sample_frequency: 1000,
            choice: Policy::Categorical,
            sample_start: "Hello,".to_string(),
            sample_end: None,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Reads the `CHAR_RNN_*` environment variables, falling back to the defaults.
    ///
    /// # Returns
    /// An `InvalidConfig` error if a variable is set but can't be parsed.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let seed = match env::var("CHAR_RNN_SEED") {
            Ok(raw) => Some(parse_var("CHAR_RNN_SEED", &raw)?),
            Err(_) => None,
        };

        let sample_end = match env::var("CHAR_RNN_SAMPLE_END") {
            Ok(raw) => parse_end(&raw)?,
            Err(_) => None,
        };

        Ok(Self {
            hidden_size: var_or("CHAR_RNN_HIDDEN", defaults.hidden_size)?,
            window_size: var_or("CHAR_RNN_WINDOW", defaults.window_size)?,
            learning_rate: var_or("CHAR_RNN_LEARNING_RATE", defaults.learning_rate)?,
            adagrad_epsilon: var_or("CHAR_RNN_EPSILON", defaults.adagrad_epsilon)?,
            weight_init_scale: var_or("CHAR_RNN_INIT_SCALE", defaults.weight_init_scale)?,
            epochs: var_or("CHAR_RNN_EPOCHS", defaults.epochs)?,
            sample_size: var_or("CHAR_RNN_SAMPLE_SIZE", defaults.sample_size)?,
            sample_frequency: var_or("CHAR_RNN_SAMPLE_FREQUENCY", defaults.sample_frequency)?,
            choice: var_or("CHAR_RNN_CHOICE", defaults.choice)?,
            sample_start: env::var("CHAR_RNN_SAMPLE_START").unwrap_or(defaults.sample_start),
            sample_end,
            seed,
        })
    }

    /// Builds the network configuration for a vocabulary of `vocab_size` symbols.
    pub fn network(&self, vocab_size: usize) -> NetworkConfig {
        NetworkConfig::new(vocab_size, vocab_size)
            .with_hidden_size(self.hidden_size)
            .with_window_size(self.window_size)
            .with_learning_rate(self.learning_rate)
            .with_adagrad_epsilon(self.adagrad_epsilon)
            .with_weight_init(InitDistribution::Normal, self.weight_init_scale)
    }
}

fn var_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => parse_var(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| RnnErr::InvalidConfig(format!("can't parse {name}={raw:?}")))
}

/// An empty pattern means samples are never cut.
fn parse_end(raw: &str) -> Result<Option<Regex>> {
    if raw.is_empty() {
        return Ok(None);
    }

    Regex::new(raw)
        .map(Some)
        .map_err(|e| RnnErr::InvalidConfig(format!("bad CHAR_RNN_SAMPLE_END {raw:?}: {e}")))
}
