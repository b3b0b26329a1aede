mod policy;
mod sampler;

pub use policy::{Argmax, Categorical, Policy, SelectionPolicy};
pub use sampler::{HiddenInit, Sampler, SamplerConfig};
