use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use log::{debug, info, trace, warn};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task,
};

use super::{ErrorPolicy, PipelineConfig, PipelineMetrics, TrainingBatch, step::train_on};
use crate::{
    error::{Result, RnnErr},
    parameters::ParameterStore,
};

/// Marks a session as training for as long as it lives.
#[derive(Debug)]
pub(super) struct TrainingGuard(Arc<AtomicBool>);

impl TrainingGuard {
    /// Claims `flag`, failing if someone else already holds it.
    pub(super) fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .map_err(|_| RnnErr::PipelineBusy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for TrainingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The single writer of a session while its pipeline runs.
///
/// Each batch is trained on Tokio's blocking pool via `spawn_blocking`, the loop only awaits
/// the next batch and hands the loss over.
pub(super) struct TrainingWorker {
    store: ParameterStore,
    config: PipelineConfig,
    metrics: PipelineMetrics,
    _guard: TrainingGuard,
}

impl TrainingWorker {
    pub(super) fn new(store: ParameterStore, config: PipelineConfig, guard: TrainingGuard) -> Self {
        Self {
            store,
            config,
            metrics: PipelineMetrics::default(),
            _guard: guard,
        }
    }

    /// Trains on every batch received until the feed is closed and drained.
    pub(super) async fn run(
        mut self,
        mut feed: mpsc::Receiver<TrainingBatch>,
        losses: mpsc::Sender<f32>,
    ) -> Result<PipelineMetrics> {
        info!("training pipeline started, on error: {:?}", self.config.on_error);

        while let Some(batch) = feed.recv().await {
            let store = self.store.clone();

            let outcome = task::spawn_blocking(move || train_on(&store, &batch))
                .await
                .map_err(|e| RnnErr::Worker(format!("step join error: {e}")))?;

            match outcome {
                Ok(loss) => {
                    self.metrics.bump_step(loss);
                    debug!(step = self.metrics.steps, loss = loss; "batch processed");

                    match losses.try_send(loss) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_) | TrySendError::Closed(_)) => {
                            self.metrics.bump_dropped();
                            trace!(step = self.metrics.steps; "loss dropped");
                        }
                    }
                }
                Err(e) => match self.config.on_error {
                    ErrorPolicy::Skip => {
                        warn!("skipping batch: {e}");
                        self.metrics.bump_skipped();
                    }
                    ErrorPolicy::Halt => {
                        warn!("halting training pipeline: {e}");
                        return Err(e);
                    }
                },
            }
        }

        info!(
            steps = self.metrics.steps,
            skipped = self.metrics.skipped;
            "feed closed, training pipeline stopped"
        );
        Ok(self.metrics)
    }
}
