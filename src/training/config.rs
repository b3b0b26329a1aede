/// What the worker does with a batch that fails validation or goes numerically unstable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log it, count it and go on with the next batch.
    #[default]
    Skip,
    /// Stop the pipeline and hand the error back through its handle.
    Halt,
}

/// Immutable settings of a training pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineConfig {
    pub on_error: ErrorPolicy,
}

impl PipelineConfig {
    pub fn new(on_error: ErrorPolicy) -> Self {
        Self { on_error }
    }
}
