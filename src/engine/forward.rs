use ndarray::{Array1, ArrayView1};

use super::softmax_rows;
use crate::{kernel, parameters::Parameters};

/// Everything the backward pass needs from one forward pass over a window.
#[derive(Debug, Clone)]
pub struct ForwardTrace {
    /// The hidden state after every step.
    pub hidden: Vec<Array1<f32>>,
    /// The unnormalized outputs of every step.
    pub outputs: Vec<Array1<f32>>,
    /// The softmax of every output.
    pub probabilities: Vec<Array1<f32>>,
}

impl ForwardTrace {
    /// The hidden state the next window should start from.
    pub fn last_hidden(&self) -> Option<&Array1<f32>> {
        self.hidden.last()
    }
}

impl Parameters {
    /// Advances the network one step.
    ///
    /// # Arguments
    /// * `x` - The input vector, of length `input_size`.
    /// * `h_prev` - The previous hidden state, of length `hidden_size`.
    ///
    /// # Returns
    /// The raw output `y` (length `output_size`) and the new hidden state `h`.
    pub fn step(
        &self,
        x: ArrayView1<'_, f32>,
        h_prev: ArrayView1<'_, f32>,
    ) -> (Array1<f32>, Array1<f32>) {
        let pre = kernel::add_all(&[
            kernel::mat_vec(self.wxh.view(), x).view(),
            kernel::mat_vec(self.whh.view(), h_prev).view(),
            self.bh.view(),
        ]);
        let h = kernel::tanh(pre.view());

        let y = kernel::add_all(&[
            kernel::mat_vec(self.why.view(), h.view()).view(),
            self.by.view(),
        ]);
        (y, h)
    }

    /// Runs `step` over a whole window, threading the hidden state through.
    ///
    /// # Returns
    /// The raw outputs and the hidden states of every step, in order.
    pub fn forward_pass(
        &self,
        xs: &[Array1<f32>],
        h_prev: ArrayView1<'_, f32>,
    ) -> (Vec<Array1<f32>>, Vec<Array1<f32>>) {
        let mut ys = Vec::with_capacity(xs.len());
        let mut hs: Vec<Array1<f32>> = Vec::with_capacity(xs.len());

        for x in xs {
            let prev = hs.last().map_or(h_prev, |h| h.view());
            let (y, h) = self.step(x.view(), prev);
            ys.push(y);
            hs.push(h);
        }

        (ys, hs)
    }

    /// Runs `forward_pass` and normalizes the outputs.
    pub fn trace(&self, xs: &[Array1<f32>], h_prev: ArrayView1<'_, f32>) -> ForwardTrace {
        let (outputs, hidden) = self.forward_pass(xs, h_prev);
        let probabilities = softmax_rows(&outputs);

        ForwardTrace {
            hidden,
            outputs,
            probabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::config::NetworkConfig;

    fn params() -> Parameters {
        let config = NetworkConfig::new(3, 2)
            .with_hidden_size(4)
            .with_weight_init(Default::default(), 0.5);
        Parameters::random(&config, StdRng::seed_from_u64(3)).unwrap()
    }

    #[test]
    fn step_dimensions() {
        let params = params();
        let (y, h) = params.step(arr1(&[0., 1., 0.]).view(), Array1::zeros(4).view());

        assert_eq!(y.len(), 2);
        assert_eq!(h.len(), 4);
        assert!(h.iter().all(|v| v.abs() < 1.));
    }

    #[test]
    fn step_with_zero_weights() {
        let config = NetworkConfig::new(2, 2).with_hidden_size(3);
        let mut params = Parameters::zeros(&config);
        params.by.assign(&arr1(&[1., -1.]));

        let (y, h) = params.step(arr1(&[1., 0.]).view(), arr1(&[0.3, 0.3, 0.3]).view());

        assert_eq!(h, Array1::<f32>::zeros(3));
        assert_eq!(y, arr1(&[1., -1.]));
    }

    #[test]
    fn forward_pass_chains_steps() {
        let params = params();
        let xs = vec![arr1(&[1., 0., 0.]), arr1(&[0., 0., 1.]), arr1(&[0., 1., 0.])];
        let h0 = arr1(&[0.1, -0.1, 0.2, 0.]);

        let (ys, hs) = params.forward_pass(&xs, h0.view());
        assert_eq!(ys.len(), 3);
        assert_eq!(hs.len(), 3);

        let (y0, h1) = params.step(xs[0].view(), h0.view());
        let (_, h2) = params.step(xs[1].view(), h1.view());
        let (y2, h3) = params.step(xs[2].view(), h2.view());

        assert_eq!(ys[0], y0);
        assert_eq!(ys[2], y2);
        assert_eq!(hs[2], h3);
    }

    #[test]
    fn empty_window() {
        let (ys, hs) = params().forward_pass(&[], Array1::zeros(4).view());
        assert!(ys.is_empty());
        assert!(hs.is_empty());
    }
}
