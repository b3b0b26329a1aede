use ndarray::{Array1, ArrayView1};
use rand::{SeedableRng, rngs::StdRng};

use super::SelectionPolicy;
use crate::{
    error::{Result, RnnErr},
    kernel,
    parameters::Snapshot,
};

/// The hidden state generation starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HiddenInit {
    /// A zero vector, generation is independent of the training position.
    #[default]
    Zero,
    /// A copy of the hidden state the snapshot was taken with.
    Carried,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SamplerConfig {
    pub hidden: HiddenInit,
    /// Seed of the sampler's generator, `None` draws one from the OS.
    pub seed: Option<u64>,
}

/// Generates sequences from a snapshot of the network.
///
/// Sampling only reads the snapshot it is given, the live network and its hidden state are
/// never touched.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
    hidden: HiddenInit,
}

impl Sampler {
    /// Creates a new `Sampler`.
    ///
    /// # Arguments
    /// * `config` - Where generation starts from and how to seed the generator.
    ///
    /// # Returns
    /// A new `Sampler` instance.
    pub fn new(config: SamplerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            rng,
            hidden: config.hidden,
        }
    }

    /// Resets the generator so the following draws are reproducible.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn initial_hidden(&self, snapshot: &Snapshot) -> Array1<f32> {
        match self.hidden {
            HiddenInit::Zero => Array1::zeros(snapshot.hidden.len()),
            HiddenInit::Carried => snapshot.hidden.clone(),
        }
    }

    /// Runs the network for `count` steps. The input of each step is the next priming symbol
    /// while there is one, then the symbol picked at the previous step.
    ///
    /// # Arguments
    /// * `snapshot` - The weights and hidden state to generate with.
    /// * `priming` - Indices of the symbols generation starts from.
    /// * `count` - The amount of symbols to return, priming included.
    /// * `policy` - Picks each generated symbol from the output probabilities.
    ///
    /// # Returns
    /// `count` indices: the priming symbols, cut at `count`, followed by the generated ones.
    pub fn sample<P>(
        &mut self,
        snapshot: &Snapshot,
        priming: &[usize],
        count: usize,
        policy: &P,
    ) -> Result<Vec<usize>>
    where
        P: SelectionPolicy + ?Sized,
    {
        let Some(&first) = priming.first() else {
            return Err(RnnErr::EmptyPriming);
        };

        let vocab_size = snapshot.params.wxh().ncols();
        let output_size = snapshot.params.why().nrows();
        if output_size != vocab_size {
            return Err(RnnErr::SizeMismatch {
                what: "output size fed back as input",
                got: output_size,
                expected: vocab_size,
            });
        }

        if let Some(&idx) = priming.iter().find(|&&idx| idx >= vocab_size) {
            return Err(RnnErr::SizeMismatch {
                what: "priming index",
                got: idx,
                expected: vocab_size,
            });
        }

        let mut out = Vec::with_capacity(count);
        let mut h = self.initial_hidden(snapshot);
        let mut next = first;

        for i in 0..count {
            out.push(next);

            let x = one_hot(next, vocab_size);
            let (y, h_next) = snapshot.params.step(x.view(), h.view());
            h = h_next;

            next = match priming.get(i + 1) {
                Some(&idx) => idx,
                None => {
                    let probs = kernel::softmax(y.view());
                    let idx = policy.select(probs.view(), &mut self.rng)?;
                    if idx >= vocab_size {
                        return Err(RnnErr::SizeMismatch {
                            what: "selected index",
                            got: idx,
                            expected: vocab_size,
                        });
                    }
                    idx
                }
            };
        }

        Ok(out)
    }

    /// Feeds `priming` unmodified, then generates `count` vectors: every distribution goes
    /// through `adapt` before being fed back as the next input.
    ///
    /// # Arguments
    /// * `snapshot` - The weights and hidden state to generate with.
    /// * `priming` - Input vectors fed unmodified before generation starts.
    /// * `count` - The amount of vectors to generate.
    /// * `adapt` - Maps a probability vector to the next input, e.g. snapping it to one-hot.
    ///
    /// # Returns
    /// The `count` adapted vectors.
    pub fn predict<F>(
        &mut self,
        snapshot: &Snapshot,
        priming: &[Array1<f32>],
        count: usize,
        mut adapt: F,
    ) -> Result<Vec<Array1<f32>>>
    where
        F: FnMut(ArrayView1<'_, f32>, &mut StdRng) -> Result<Array1<f32>>,
    {
        let Some(first) = priming.first() else {
            return Err(RnnErr::EmptyPriming);
        };

        let input_size = snapshot.params.wxh().ncols();
        if let Some(bad) = priming.iter().find(|x| x.len() != input_size) {
            return Err(RnnErr::SizeMismatch {
                what: "priming vector",
                got: bad.len(),
                expected: input_size,
            });
        }

        let mut out: Vec<Array1<f32>> = Vec::with_capacity(count);
        if count == 0 {
            return Ok(out);
        }

        let mut h = self.initial_hidden(snapshot);
        let mut x = first.clone();
        let mut step = 0;

        loop {
            let (y, h_next) = snapshot.params.step(x.view(), h.view());
            h = h_next;
            step += 1;

            if step < priming.len() {
                x = priming[step].clone();
                continue;
            }

            let probs = kernel::softmax(y.view());
            let adapted = adapt(probs.view(), &mut self.rng)?;
            if adapted.len() != input_size {
                return Err(RnnErr::SizeMismatch {
                    what: "adapted vector",
                    got: adapted.len(),
                    expected: input_size,
                });
            }

            out.push(adapted.clone());
            if out.len() == count {
                return Ok(out);
            }
            x = adapted;
        }
    }
}

fn one_hot(idx: usize, len: usize) -> Array1<f32> {
    let mut x = Array1::zeros(len);
    x[idx] = 1.;
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::NetworkConfig,
        parameters::Network,
        sampling::{Argmax, Categorical},
    };

    fn snapshot() -> Snapshot {
        let config = NetworkConfig::new(5, 5)
            .with_hidden_size(8)
            .with_weight_init(Default::default(), 0.5);
        let network = Network::new(config, Some(21)).unwrap();

        Snapshot {
            params: network.params().clone(),
            hidden: Array1::from_elem(8, 0.3),
        }
    }

    fn sampler(seed: u64) -> Sampler {
        Sampler::new(SamplerConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    #[test]
    fn argmax_is_deterministic() {
        let snapshot = snapshot();

        let a = sampler(1).sample(&snapshot, &[0, 3], 20, &Argmax).unwrap();
        let b = sampler(2).sample(&snapshot, &[0, 3], 20, &Argmax).unwrap();

        assert_eq!(a.len(), 20);
        assert_eq!(a, b);
        assert!(a.iter().all(|&i| i < 5));
    }

    #[test]
    fn reseed_reproduces_draws() {
        let snapshot = snapshot();
        let mut sampler = sampler(7);

        let first = sampler.sample(&snapshot, &[1], 30, &Categorical).unwrap();
        sampler.reseed(7);
        let second = sampler.sample(&snapshot, &[1], 30, &Categorical).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn argmax_follows_the_network() {
        let snapshot = snapshot();
        let out = sampler(0).sample(&snapshot, &[2, 4], 5, &Argmax).unwrap();

        let params = &snapshot.params;
        let h = Array1::zeros(8);
        let (_, h) = params.step(one_hot(2, 5).view(), h.view());
        let (y, mut h) = params.step(one_hot(4, 5).view(), h.view());

        let mut expected = vec![2, 4, kernel::argmax(y.view())];
        for _ in 0..2 {
            let x = one_hot(*expected.last().unwrap(), 5);
            let (y, h_next) = params.step(x.view(), h.view());
            h = h_next;
            expected.push(kernel::argmax(y.view()));
        }

        assert_eq!(out, expected);
    }

    #[test]
    fn carried_hidden_changes_the_start() {
        let snapshot = snapshot();
        let mut zero = sampler(0);
        let mut carried = Sampler::new(SamplerConfig {
            hidden: HiddenInit::Carried,
            seed: Some(0),
        });

        let probs = |s: &mut Sampler| {
            s.predict(&snapshot, &[one_hot(0, 5)], 1, |p, _| Ok(p.to_owned()))
                .unwrap()
        };
        assert_ne!(probs(&mut zero), probs(&mut carried));
    }

    #[test]
    fn empty_priming() {
        let snapshot = snapshot();
        assert!(matches!(
            sampler(0).sample(&snapshot, &[], 5, &Argmax),
            Err(RnnErr::EmptyPriming)
        ));
    }

    #[test]
    fn priming_out_of_range() {
        let snapshot = snapshot();
        assert!(sampler(0).sample(&snapshot, &[9], 5, &Argmax).is_err());
    }

    #[test]
    fn zero_count() {
        let snapshot = snapshot();
        assert!(sampler(0).sample(&snapshot, &[1], 0, &Argmax).unwrap().is_empty());
    }

    #[test]
    fn priming_is_echoed_and_cut_at_count() {
        let snapshot = snapshot();

        let out = sampler(0).sample(&snapshot, &[4, 0, 2], 2, &Argmax).unwrap();
        assert_eq!(out, vec![4, 0]);

        let out = sampler(0).sample(&snapshot, &[4, 0, 2], 3, &Argmax).unwrap();
        assert_eq!(out, vec![4, 0, 2]);

        let out = sampler(0).sample(&snapshot, &[4, 0, 2], 7, &Argmax).unwrap();
        assert_eq!(out.len(), 7);
        assert_eq!(&out[..3], &[4, 0, 2]);
    }

    #[test]
    fn output_size_must_match_input_size() {
        let config = NetworkConfig::new(2, 6).with_hidden_size(4);
        let network = Network::new(config, Some(3)).unwrap();
        let snapshot = Snapshot {
            params: network.params().clone(),
            hidden: Array1::zeros(4),
        };

        assert!(matches!(
            sampler(0).sample(&snapshot, &[0], 5, &Argmax),
            Err(RnnErr::SizeMismatch { .. })
        ));
    }

    struct OutOfRange;

    impl SelectionPolicy for OutOfRange {
        fn select(&self, probs: ArrayView1<'_, f32>, _: &mut StdRng) -> Result<usize> {
            Ok(probs.len())
        }
    }

    #[test]
    fn rejects_a_policy_picking_outside_the_vocabulary() {
        let snapshot = snapshot();
        assert!(matches!(
            sampler(0).sample(&snapshot, &[1], 3, &OutOfRange),
            Err(RnnErr::SizeMismatch { .. })
        ));
    }

    #[test]
    fn predict_with_one_hot_matches_sample() {
        let snapshot = snapshot();
        let priming = [one_hot(1, 5), one_hot(3, 5)];

        let predicted = sampler(0)
            .predict(&snapshot, &priming, 10, |p, rng| Argmax.one_hot(p, rng))
            .unwrap();
        let sampled = sampler(0).sample(&snapshot, &[1, 3], 12, &Argmax).unwrap();

        let decoded: Vec<usize> = predicted
            .iter()
            .map(|v| kernel::argmax(v.view()))
            .collect();
        assert_eq!(decoded, &sampled[2..]);
    }

    #[test]
    fn predict_raw_probabilities() {
        let snapshot = snapshot();
        let out = sampler(0)
            .predict(&snapshot, &[one_hot(0, 5)], 4, |p, _| Ok(p.to_owned()))
            .unwrap();

        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|p| (p.sum() - 1.).abs() < 1e-5));
    }

    #[test]
    fn predict_rejects_bad_adapt() {
        let snapshot = snapshot();
        let result =
            sampler(0).predict(&snapshot, &[one_hot(0, 5)], 2, |_, _| Ok(Array1::zeros(2)));
        assert!(matches!(result, Err(RnnErr::SizeMismatch { .. })));
    }
}
