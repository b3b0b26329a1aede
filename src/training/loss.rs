/// Exponential moving average of the training loss, the figure worth logging since single
/// window losses are noisy.
#[derive(Debug, Clone, Copy)]
pub struct LossTracker {
    smooth: f32,
}

impl LossTracker {
    /// Starts the average at the loss of a uniform guess, `-ln(1 / vocab_size) · window_size`.
    pub fn new(vocab_size: usize, window_size: usize) -> Self {
        let uniform = -(1. / vocab_size as f32).ln();
        Self {
            smooth: uniform * window_size as f32,
        }
    }

    /// Folds in a new loss and returns the updated average.
    pub fn record(&mut self, loss: f32) -> f32 {
        self.smooth = self.smooth * 0.999 + loss * 0.001;
        self.smooth
    }

    pub fn smooth(&self) -> f32 {
        self.smooth
    }
}
