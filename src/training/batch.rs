use ndarray::Array1;

use crate::{
    config::NetworkConfig,
    error::{Result, RnnErr},
};

/// One window of inputs and the symbols that follow each of them.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingBatch {
    inputs: Vec<Array1<f32>>,
    targets: Vec<Array1<f32>>,
}

impl TrainingBatch {
    /// Creates a new `TrainingBatch`.
    ///
    /// # Arguments
    /// * `inputs` - One-hot input vectors.
    /// * `targets` - One-hot target vectors, `targets[t]` is the symbol following `inputs[t]`.
    ///
    /// # Returns
    /// A size mismatch error if both sequences don't have the same length.
    pub fn new(inputs: Vec<Array1<f32>>, targets: Vec<Array1<f32>>) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(RnnErr::SizeMismatch {
                what: "targets",
                got: targets.len(),
                expected: inputs.len(),
            });
        }

        Ok(Self { inputs, targets })
    }

    /// Builds a batch of one-hot vectors from symbol indices.
    ///
    /// # Arguments
    /// * `inputs` - Input symbol indices.
    /// * `targets` - Target symbol indices.
    /// * `input_size` - Length of the input vectors.
    /// * `output_size` - Length of the target vectors.
    ///
    /// # Returns
    /// A size mismatch error if an index doesn't fit its vector or the lengths differ.
    pub fn from_indices(
        inputs: &[usize],
        targets: &[usize],
        input_size: usize,
        output_size: usize,
    ) -> Result<Self> {
        let hot = |idx: usize, len: usize, what: &'static str| {
            if idx >= len {
                return Err(RnnErr::SizeMismatch {
                    what,
                    got: idx,
                    expected: len,
                });
            }

            let mut v = Array1::<f32>::zeros(len);
            v[idx] = 1.;
            Ok(v)
        };

        let inputs = inputs
            .iter()
            .map(|&idx| hot(idx, input_size, "input index"))
            .collect::<Result<Vec<_>>>()?;
        let targets = targets
            .iter()
            .map(|&idx| hot(idx, output_size, "target index"))
            .collect::<Result<Vec<_>>>()?;

        Self::new(inputs, targets)
    }

    /// Builds the batch of a text window: every symbol but the last is an input and every
    /// symbol but the first is a target.
    ///
    /// Every index in `symbols` must be below `vocab_size`.
    pub(crate) fn from_window(symbols: &[usize], vocab_size: usize) -> Self {
        let hot = |&idx: &usize| {
            let mut v = Array1::<f32>::zeros(vocab_size);
            v[idx] = 1.;
            v
        };

        let n = symbols.len().saturating_sub(1);
        Self {
            inputs: symbols[..n].iter().map(&hot).collect(),
            targets: symbols.iter().skip(1).map(&hot).collect(),
        }
    }

    pub fn inputs(&self) -> &[Array1<f32>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[Array1<f32>] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Checks the batch has the window length and vector sizes `config` asks for.
    pub fn validate(&self, config: &NetworkConfig) -> Result<()> {
        if self.len() != config.window_size {
            return Err(RnnErr::SizeMismatch {
                what: "batch window",
                got: self.len(),
                expected: config.window_size,
            });
        }

        if let Some(x) = self.inputs.iter().find(|x| x.len() != config.input_size) {
            return Err(RnnErr::SizeMismatch {
                what: "input vector",
                got: x.len(),
                expected: config.input_size,
            });
        }

        if let Some(y) = self.targets.iter().find(|y| y.len() != config.output_size) {
            return Err(RnnErr::SizeMismatch {
                what: "target vector",
                got: y.len(),
                expected: config.output_size,
            });
        }

        Ok(())
    }
}
