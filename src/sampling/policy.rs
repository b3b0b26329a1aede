use std::{fmt, str::FromStr};

use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand_distr::{Distribution, weighted::WeightedIndex};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, RnnErr},
    kernel,
};

/// Picks the next symbol from a probability vector.
pub trait SelectionPolicy {
    /// Chooses an index of `probs`.
    ///
    /// # Arguments
    /// * `probs` - A probability vector.
    /// * `rng` - The sampler's random number generator.
    ///
    /// # Returns
    /// An error if `probs` can't be drawn from.
    fn select(&self, probs: ArrayView1<'_, f32>, rng: &mut StdRng) -> Result<usize>;

    /// Snaps `probs` to the one-hot vector of the selected index.
    fn one_hot(&self, probs: ArrayView1<'_, f32>, rng: &mut StdRng) -> Result<Array1<f32>> {
        let idx = self.select(probs, rng)?;
        let mut hot = Array1::zeros(probs.len());
        hot[idx] = 1.;
        Ok(hot)
    }
}

/// Always the most likely symbol, the first one on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argmax;

impl SelectionPolicy for Argmax {
    fn select(&self, probs: ArrayView1<'_, f32>, _: &mut StdRng) -> Result<usize> {
        Ok(kernel::argmax(probs))
    }
}

/// Draws the symbol from the categorical distribution `probs` describes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Categorical;

impl SelectionPolicy for Categorical {
    fn select(&self, probs: ArrayView1<'_, f32>, rng: &mut StdRng) -> Result<usize> {
        let dist = WeightedIndex::new(probs.iter())
            .map_err(|_| RnnErr::NumericInstability { what: "probabilities" })?;
        Ok(dist.sample(rng))
    }
}

/// The selection policies the command line can pick, `hard` or `soft`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    #[serde(alias = "hard")]
    Argmax,
    #[default]
    #[serde(alias = "soft")]
    Categorical,
}

impl SelectionPolicy for Policy {
    fn select(&self, probs: ArrayView1<'_, f32>, rng: &mut StdRng) -> Result<usize> {
        match self {
            Policy::Argmax => Argmax.select(probs, rng),
            Policy::Categorical => Categorical.select(probs, rng),
        }
    }
}

impl FromStr for Policy {
    type Err = RnnErr;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hard" | "argmax" => Ok(Policy::Argmax),
            "soft" | "categorical" => Ok(Policy::Categorical),
            other => Err(RnnErr::InvalidConfig(format!(
                "unknown selection policy {other:?}, expected hard or soft"
            ))),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Argmax => f.write_str("hard"),
            Policy::Categorical => f.write_str("soft"),
        }
    }
}
