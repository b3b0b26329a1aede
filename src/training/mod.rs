mod batch;
mod config;
mod loss;
mod metrics;
mod pipeline;
mod session;
mod step;
mod worker;

pub use batch::TrainingBatch;
pub use config::{ErrorPolicy, PipelineConfig};
pub use loss::LossTracker;
pub use metrics::PipelineMetrics;
pub use pipeline::{BatchSender, LossReceiver, Pipeline, PipelineHandle};
pub use session::TrainingSession;
