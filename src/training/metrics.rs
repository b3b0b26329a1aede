#[derive(Debug, Default, Clone)]
pub struct PipelineMetrics {
    /// Batches whose update was committed.
    pub steps: u64,
    /// Batches rejected under `ErrorPolicy::Skip`.
    pub skipped: u64,
    /// Loss values nobody was ready to receive.
    pub dropped_losses: u64,
    pub last_loss: Option<f32>,
}

impl PipelineMetrics {
    #[inline]
    pub fn bump_step(&mut self, loss: f32) {
        self.steps += 1;
        self.last_loss = Some(loss);
    }

    #[inline]
    pub fn bump_skipped(&mut self) {
        self.skipped += 1;
    }

    #[inline]
    pub fn bump_dropped(&mut self) {
        self.dropped_losses += 1;
    }
}
