use std::num::NonZeroUsize;

use log::{debug, info};

use super::Vocabulary;
use crate::{
    error::{Result, RnnErr},
    training::{BatchSender, TrainingBatch},
};

/// Cuts a text into consecutive training windows.
///
/// Window `k` covers `text[k·T..k·T + T]` and its targets are shifted by one symbol, so each
/// window starts where the previous one's inputs ended and the carried hidden state stays
/// meaningful. A trailing piece shorter than a window is left out.
#[derive(Debug, Clone)]
pub struct TextFeeder {
    indices: Vec<usize>,
    vocab_size: usize,
    window: NonZeroUsize,
    epochs: NonZeroUsize,
}

impl TextFeeder {
    /// Creates a new `TextFeeder`.
    ///
    /// # Arguments
    /// * `vocabulary` - Encodes the text.
    /// * `text` - The training text.
    /// * `window` - The amount of symbols per batch.
    /// * `epochs` - How many times to go over the whole text.
    ///
    /// # Returns
    /// An error if the text has symbols outside `vocabulary` or isn't longer than a window.
    pub fn new(
        vocabulary: &Vocabulary,
        text: &str,
        window: NonZeroUsize,
        epochs: NonZeroUsize,
    ) -> Result<Self> {
        let indices = vocabulary.encode(text)?;

        if indices.len() <= window.get() {
            return Err(RnnErr::InvalidConfig(format!(
                "a text of {} symbols can't fill a window of {} plus its target",
                indices.len(),
                window
            )));
        }

        Ok(Self {
            indices,
            vocab_size: vocabulary.len(),
            window,
            epochs,
        })
    }

    /// The amount of batches in one epoch.
    pub fn batches_per_epoch(&self) -> usize {
        (self.indices.len() - 1) / self.window.get()
    }

    pub fn epochs(&self) -> usize {
        self.epochs.get()
    }

    /// Every batch of every epoch, in order, tagged with its epoch.
    pub fn batches(&self) -> impl Iterator<Item = (usize, TrainingBatch)> + '_ {
        let window = self.window.get();
        let per_epoch = self.batches_per_epoch();

        (0..self.epochs()).flat_map(move |epoch| {
            (0..per_epoch).map(move |k| {
                let start = k * window;
                let symbols = &self.indices[start..start + window + 1];
                (epoch, TrainingBatch::from_window(symbols, self.vocab_size))
            })
        })
    }

    /// Pushes every batch into `sender` and closes it once done.
    ///
    /// # Returns
    /// The amount of batches sent, or `PipelineClosed` if the worker stopped first.
    pub async fn feed(self, sender: BatchSender) -> Result<usize> {
        let mut sent = 0;
        let mut current_epoch = 0;

        for (epoch, batch) in self.batches() {
            if epoch != current_epoch {
                debug!(epoch = epoch, batches = sent; "starting epoch");
                current_epoch = epoch;
            }

            sender.send(batch).await?;
            sent += 1;
        }

        info!(batches = sent; "text fed, closing the pipeline feed");
        sender.close();
        Ok(sent)
    }
}
