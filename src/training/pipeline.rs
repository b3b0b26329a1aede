use tokio::{sync::mpsc, task::JoinHandle};

use super::{PipelineMetrics, TrainingBatch};
use crate::error::{Result, RnnErr};

/// The feeding end of a pipeline.
///
/// There is exactly one per pipeline and it isn't `Clone`: once it is closed or dropped the
/// worker finishes the batches already accepted and stops.
#[derive(Debug)]
pub struct BatchSender {
    tx: mpsc::Sender<TrainingBatch>,
}

impl BatchSender {
    pub(super) fn new(tx: mpsc::Sender<TrainingBatch>) -> Self {
        Self { tx }
    }

    /// Hands `batch` to the worker, waiting while the previous one hasn't been picked up.
    ///
    /// # Returns
    /// `PipelineClosed` if the worker has stopped.
    pub async fn send(&self, batch: TrainingBatch) -> Result<()> {
        self.tx.send(batch).await.map_err(|_| RnnErr::PipelineClosed)
    }

    /// Whether the worker has stopped accepting batches.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Closes the feed, no batch is accepted afterwards.
    pub fn close(self) {}
}

/// Best effort stream of the loss of every committed batch.
///
/// The worker never waits on it, values nobody was ready to take are dropped.
#[derive(Debug)]
pub struct LossReceiver {
    rx: mpsc::Receiver<f32>,
}

impl LossReceiver {
    pub(super) fn new(rx: mpsc::Receiver<f32>) -> Self {
        Self { rx }
    }

    /// Waits for the next loss, `None` once the worker has stopped.
    pub async fn recv(&mut self) -> Option<f32> {
        self.rx.recv().await
    }

    /// Takes a loss if one is ready.
    pub fn try_recv(&mut self) -> Option<f32> {
        self.rx.try_recv().ok()
    }
}

/// Resolves to the worker's metrics once it stops.
#[derive(Debug)]
pub struct PipelineHandle {
    handle: JoinHandle<Result<PipelineMetrics>>,
}

impl PipelineHandle {
    pub(super) fn new(handle: JoinHandle<Result<PipelineMetrics>>) -> Self {
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker to stop.
    ///
    /// # Returns
    /// The metrics of the run, or the error that halted it.
    pub async fn join(self) -> Result<PipelineMetrics> {
        self.handle
            .await
            .map_err(|e| RnnErr::Worker(format!("pipeline join error: {e}")))?
    }
}

/// A running training pipeline: a bounded batch feed, a loss stream and the worker's handle.
#[derive(Debug)]
pub struct Pipeline {
    feed: BatchSender,
    losses: LossReceiver,
    handle: PipelineHandle,
}

impl Pipeline {
    pub(super) fn new(feed: BatchSender, losses: LossReceiver, handle: PipelineHandle) -> Self {
        Self {
            feed,
            losses,
            handle,
        }
    }

    /// See `BatchSender::send`.
    pub async fn submit(&self, batch: TrainingBatch) -> Result<()> {
        self.feed.send(batch).await
    }

    /// See `LossReceiver::recv`.
    pub async fn next_loss(&mut self) -> Option<f32> {
        self.losses.recv().await
    }

    /// See `LossReceiver::try_recv`.
    pub fn try_loss(&mut self) -> Option<f32> {
        self.losses.try_recv()
    }

    /// Closes the feed and waits for the worker to finish the batches it already accepted.
    pub async fn close(self) -> Result<PipelineMetrics> {
        let Self { feed, handle, .. } = self;
        feed.close();
        handle.join().await
    }

    /// Splits the pipeline so feeding and loss reporting can live in different tasks.
    pub fn into_parts(self) -> (BatchSender, LossReceiver, PipelineHandle) {
        (self.feed, self.losses, self.handle)
    }
}
