use std::{cell::RefCell, rc::Rc};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewD, ArrayViewMutD};
use rand::Rng;

use crate::{
    config::{InitDistribution, NetworkConfig},
    error::{Result, RnnErr},
    initialization::{ConstParamGen, ParamGen, RandParamGen},
};

/// The weights and biases of the recurrent network.
///
/// The same layout doubles as the gradient buffer and the Adagrad memory, every array lines
/// up element by element across the three roles.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub(crate) wxh: Array2<f32>,
    pub(crate) whh: Array2<f32>,
    pub(crate) why: Array2<f32>,
    pub(crate) bh: Array1<f32>,
    pub(crate) by: Array1<f32>,
}

/// The gradient of the loss with respect to every parameter.
pub type Gradients = Parameters;

impl Parameters {
    /// Creates a new `Parameters` set filled with zeros.
    ///
    /// # Arguments
    /// * `config` - The network's configuration.
    ///
    /// # Returns
    /// A new `Parameters` instance.
    pub fn zeros(config: &NetworkConfig) -> Self {
        let NetworkConfig {
            input_size: i,
            hidden_size: h,
            output_size: o,
            ..
        } = *config;

        Self {
            wxh: Array2::zeros((h, i)),
            whh: Array2::zeros((h, h)),
            why: Array2::zeros((o, h)),
            bh: Array1::zeros(h),
            by: Array1::zeros(o),
        }
    }

    /// Creates a new `Parameters` set with random weights and zero biases.
    ///
    /// # Arguments
    /// * `config` - The network's configuration, it picks the distribution and its scale.
    /// * `rng` - The random number generator the weights are drawn from.
    ///
    /// # Returns
    /// An error if the distribution can't be built from the configured scale.
    pub fn random<R: Rng>(config: &NetworkConfig, rng: R) -> Result<Self> {
        let limit = Self::weight_count(config);
        let rng = Rc::new(RefCell::new(rng));
        let scale = config.weight_init_scale;

        if scale == 0. {
            return Self::generate(config, &mut ConstParamGen::zeros(limit));
        }

        match config.init {
            InitDistribution::Normal => {
                Self::generate(config, &mut RandParamGen::normal(rng, limit, scale)?)
            }
            InitDistribution::Uniform => {
                Self::generate(config, &mut RandParamGen::uniform(rng, limit, scale)?)
            }
        }
    }

    /// Builds the weight matrices from `weight_gen` and the biases from zeros.
    ///
    /// # Arguments
    /// * `config` - The network's configuration.
    /// * `weight_gen` - Generator for `wxh`, `whh` and `why`, in that order.
    ///
    /// # Returns
    /// An error if the generator runs out before every weight is drawn.
    pub fn generate<G: ParamGen>(config: &NetworkConfig, weight_gen: &mut G) -> Result<Self> {
        let NetworkConfig {
            input_size: i,
            hidden_size: h,
            output_size: o,
            ..
        } = *config;

        let exhausted = || RnnErr::InvalidConfig("weight generator exhausted".into());
        let mut bias_gen = ConstParamGen::zeros(h + o);

        Ok(Self {
            wxh: weight_gen.matrix(h, i).ok_or_else(exhausted)?,
            whh: weight_gen.matrix(h, h).ok_or_else(exhausted)?,
            why: weight_gen.matrix(o, h).ok_or_else(exhausted)?,
            bh: bias_gen.vector(h).ok_or_else(exhausted)?,
            by: bias_gen.vector(o).ok_or_else(exhausted)?,
        })
    }

    /// Rebuilds a set from the flat layout produced by `flatten`.
    ///
    /// # Arguments
    /// * `config` - The network's configuration.
    /// * `values` - `wxh`, `whh`, `why`, `bh` and `by`, concatenated in row major order.
    ///
    /// # Returns
    /// A size mismatch error if `values` doesn't hold exactly `Self::count(config)` elements.
    pub fn from_flat(config: &NetworkConfig, values: &[f32]) -> Result<Self> {
        let expected = Self::count(config);
        if values.len() != expected {
            return Err(RnnErr::SizeMismatch {
                what: "flat parameters",
                got: values.len(),
                expected,
            });
        }

        let mut set = Self::zeros(config);
        let mut rest = values;

        for mut view in set.views_mut() {
            let (head, tail) = rest.split_at(view.len());
            view.iter_mut().zip(head).for_each(|(p, &v)| *p = v);
            rest = tail;
        }

        Ok(set)
    }

    /// The amount of weights (biases excluded) for the given configuration.
    pub fn weight_count(config: &NetworkConfig) -> usize {
        let NetworkConfig {
            input_size: i,
            hidden_size: h,
            output_size: o,
            ..
        } = *config;

        h * i + h * h + o * h
    }

    /// The amount of scalars in a full set for the given configuration.
    pub fn count(config: &NetworkConfig) -> usize {
        Self::weight_count(config) + config.hidden_size + config.output_size
    }

    pub fn len(&self) -> usize {
        self.views().iter().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn wxh(&self) -> ArrayView2<'_, f32> {
        self.wxh.view()
    }

    pub fn whh(&self) -> ArrayView2<'_, f32> {
        self.whh.view()
    }

    pub fn why(&self) -> ArrayView2<'_, f32> {
        self.why.view()
    }

    pub fn bh(&self) -> ArrayView1<'_, f32> {
        self.bh.view()
    }

    pub fn by(&self) -> ArrayView1<'_, f32> {
        self.by.view()
    }

    /// Dynamic views over the five arrays, always in `wxh, whh, why, bh, by` order.
    pub fn views(&self) -> [ArrayViewD<'_, f32>; 5] {
        [
            self.wxh.view().into_dyn(),
            self.whh.view().into_dyn(),
            self.why.view().into_dyn(),
            self.bh.view().into_dyn(),
            self.by.view().into_dyn(),
        ]
    }

    /// Mutable counterpart of `views`.
    pub fn views_mut(&mut self) -> [ArrayViewMutD<'_, f32>; 5] {
        [
            self.wxh.view_mut().into_dyn(),
            self.whh.view_mut().into_dyn(),
            self.why.view_mut().into_dyn(),
            self.bh.view_mut().into_dyn(),
            self.by.view_mut().into_dyn(),
        ]
    }

    /// Whether both sets have arrays of the same shapes.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.views()
            .iter()
            .zip(other.views().iter())
            .all(|(a, b)| a.shape() == b.shape())
    }

    /// Whether there's no NaN or infinite value in the set.
    pub fn is_finite(&self) -> bool {
        self.views()
            .iter()
            .all(|v| v.iter().all(|x| x.is_finite()))
    }

    /// Copies every scalar into a single vector, see `from_flat`.
    pub fn flatten(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len());
        for view in self.views() {
            out.extend(view.iter().copied());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn config() -> NetworkConfig {
        NetworkConfig::new(3, 4).with_hidden_size(5)
    }

    #[test]
    fn shapes() {
        let params = Parameters::zeros(&config());

        assert_eq!(params.wxh.dim(), (5, 3));
        assert_eq!(params.whh.dim(), (5, 5));
        assert_eq!(params.why.dim(), (4, 5));
        assert_eq!(params.bh.len(), 5);
        assert_eq!(params.by.len(), 4);
        assert_eq!(params.len(), Parameters::count(&config()));
    }

    #[test]
    fn random_weights_zero_biases() {
        let params = Parameters::random(&config(), StdRng::seed_from_u64(42)).unwrap();

        assert!(params.wxh.iter().any(|&w| w != 0.));
        assert!(params.whh.iter().any(|&w| w != 0.));
        assert!(params.why.iter().any(|&w| w != 0.));
        assert!(params.bh.iter().all(|&b| b == 0.));
        assert!(params.by.iter().all(|&b| b == 0.));
    }

    #[test]
    fn uniform_respects_scale() {
        let config = config().with_weight_init(InitDistribution::Uniform, 0.1);
        let params = Parameters::random(&config, StdRng::seed_from_u64(7)).unwrap();

        assert!(params.wxh.iter().all(|w| w.abs() <= 0.1));
        assert!(params.why.iter().all(|w| w.abs() <= 0.1));
    }

    #[test]
    fn zero_scale() {
        let config = config().with_weight_init(InitDistribution::Uniform, 0.);
        let params = Parameters::random(&config, StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(params, Parameters::zeros(&config));
    }

    #[test]
    fn flat_layout() {
        let params = Parameters::random(&config(), StdRng::seed_from_u64(1)).unwrap();
        let flat = params.flatten();

        assert_eq!(flat.len(), params.len());
        assert_eq!(flat[0], params.wxh[[0, 0]]);
        assert_eq!(flat[1], params.wxh[[0, 1]]);
        assert_eq!(Parameters::from_flat(&config(), &flat).unwrap(), params);
    }

    #[test]
    fn from_flat_wrong_len() {
        let err = Parameters::from_flat(&config(), &[0.; 3]).unwrap_err();
        assert!(matches!(err, RnnErr::SizeMismatch { got: 3, .. }));
    }

    #[test]
    fn non_finite() {
        let mut params = Parameters::zeros(&config());
        assert!(params.is_finite());

        params.by[2] = f32::NAN;
        assert!(!params.is_finite());
    }
}
