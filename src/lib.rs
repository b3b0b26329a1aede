pub mod checkpoint;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod initialization;
pub mod kernel;
pub mod optimization;
pub mod parameters;
pub mod sampling;
pub mod training;

pub use checkpoint::Checkpoint;
pub use codec::{TextFeeder, Vocabulary};
pub use config::{InitDistribution, NetworkConfig, RunConfig};
pub use error::{Result, RnnErr};
pub use parameters::{Network, Parameters, Snapshot};
pub use sampling::{
    Argmax, Categorical, HiddenInit, Policy, Sampler, SamplerConfig, SelectionPolicy,
};
pub use training::{
    ErrorPolicy, LossTracker, Pipeline, PipelineConfig, PipelineMetrics, TrainingBatch,
    TrainingSession,
};
