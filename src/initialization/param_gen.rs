use ndarray::{Array1, Array2};

/// A `ParamGen` generates values for the initial state of the network's parameters.
pub trait ParamGen {
    /// Should sample at most `n` parameters.
    ///
    /// # Arguments
    /// * `n` - The upper limit of samples to generate.
    ///
    /// # Returns
    /// `None` once the generator is exhausted.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;

    /// Samples a full `rows × cols` matrix.
    ///
    /// # Returns
    /// `None` if the generator can't provide `rows * cols` values.
    fn matrix(&mut self, rows: usize, cols: usize) -> Option<Array2<f32>> {
        let values = self.sample(rows * cols)?;
        Array2::from_shape_vec((rows, cols), values).ok()
    }

    /// Samples a full vector of `len` values.
    ///
    /// # Returns
    /// `None` if the generator can't provide `len` values.
    fn vector(&mut self, len: usize) -> Option<Array1<f32>> {
        let values = self.sample(len)?;
        (values.len() == len).then(|| Array1::from_vec(values))
    }
}
