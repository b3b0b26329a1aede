use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use tokio::{runtime::Handle, sync::mpsc};

use super::{
    BatchSender, LossReceiver, Pipeline, PipelineConfig, PipelineHandle, TrainingBatch,
    step::train_on,
    worker::{TrainingGuard, TrainingWorker},
};
use crate::{
    checkpoint::{self, Checkpoint},
    codec::Vocabulary,
    config::NetworkConfig,
    error::{Result, RnnErr},
    parameters::{Network, ParameterStore, Snapshot},
    sampling::{Sampler, SelectionPolicy},
};

/// Owns a network and is the only way to train, sample, save or restore it.
///
/// At most one writer runs at a time: either a pipeline or a single `train_step`.
#[derive(Debug)]
pub struct TrainingSession {
    store: ParameterStore,
    training: Arc<AtomicBool>,
}

impl TrainingSession {
    /// Creates a new `TrainingSession` around a freshly initialized network.
    ///
    /// # Arguments
    /// * `config` - The network's configuration.
    /// * `seed` - Seed for the weight initialization, `None` draws one from the OS.
    ///
    /// # Returns
    /// An error if the configuration is invalid.
    pub fn new(config: NetworkConfig, seed: Option<u64>) -> Result<Self> {
        Ok(Self::from_network(Network::new(config, seed)?))
    }

    pub fn from_network(network: Network) -> Self {
        Self {
            store: ParameterStore::new(network),
            training: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a session resuming the checkpoint in `bytes`.
    ///
    /// # Returns
    /// The session and the vocabulary stored along the network, if any.
    pub fn from_checkpoint(bytes: &[u8]) -> Result<(Self, Option<Vocabulary>)> {
        let Checkpoint {
            network,
            vocabulary,
        } = Checkpoint::decode(bytes)?;
        Ok((Self::from_network(network), vocabulary))
    }

    pub fn config(&self) -> &NetworkConfig {
        self.store.config()
    }

    pub fn is_training(&self) -> bool {
        self.training.load(Ordering::Acquire)
    }

    /// Starts a pipeline on the current Tokio runtime.
    ///
    /// # Returns
    /// `PipelineBusy` if the session is already training, or a worker error when called
    /// outside a runtime.
    pub fn train(&self, config: PipelineConfig) -> Result<Pipeline> {
        let runtime = Handle::try_current().map_err(|e| RnnErr::Worker(e.to_string()))?;
        let guard = TrainingGuard::acquire(&self.training)?;

        let (feed_tx, feed_rx) = mpsc::channel(1);
        let (loss_tx, loss_rx) = mpsc::channel(1);

        let worker = TrainingWorker::new(self.store.clone(), config, guard);
        let handle = runtime.spawn(worker.run(feed_rx, loss_tx));

        Ok(Pipeline::new(
            BatchSender::new(feed_tx),
            LossReceiver::new(loss_rx),
            PipelineHandle::new(handle),
        ))
    }

    /// Trains on one batch on the calling thread, the same way a pipeline worker does.
    ///
    /// # Returns
    /// The batch's loss, or why it was rejected. `PipelineBusy` if a pipeline is running.
    pub fn train_step(&self, batch: &TrainingBatch) -> Result<f32> {
        let _guard = TrainingGuard::acquire(&self.training)?;
        train_on(&self.store, batch)
    }

    /// A private copy of the current weights and hidden state.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Runs `count` sampling steps from `priming`, see `Sampler::sample`.
    pub fn sample<P>(
        &self,
        sampler: &mut Sampler,
        priming: &[usize],
        count: usize,
        policy: &P,
    ) -> Result<Vec<usize>>
    where
        P: SelectionPolicy + ?Sized,
    {
        sampler.sample(&self.snapshot(), priming, count, policy)
    }

    /// Generates `count` adapted probability vectors after `priming`, see `Sampler::predict`.
    pub fn predict<F>(
        &self,
        sampler: &mut Sampler,
        priming: &[Array1<f32>],
        count: usize,
        adapt: F,
    ) -> Result<Vec<Array1<f32>>>
    where
        F: FnMut(ArrayView1<'_, f32>, &mut StdRng) -> Result<Array1<f32>>,
    {
        sampler.predict(&self.snapshot(), priming, count, adapt)
    }

    pub fn hidden_state(&self) -> Array1<f32> {
        self.store.hidden()
    }

    /// Zeroes the carried hidden state, the next batch starts from scratch.
    ///
    /// # Returns
    /// `PipelineBusy` if the session is training.
    pub fn reset_hidden(&self) -> Result<()> {
        let _guard = TrainingGuard::acquire(&self.training)?;
        self.store.reset_hidden();
        Ok(())
    }

    /// Encodes the whole network, and optionally `vocabulary`, into a checkpoint.
    pub fn checkpoint(&self, vocabulary: Option<&Vocabulary>) -> Result<Vec<u8>> {
        self.store
            .read(|network| checkpoint::encode(network, vocabulary))
    }

    /// Replaces the network with the one stored in `bytes`.
    ///
    /// The checkpoint is fully decoded before anything is replaced, a malformed one leaves the
    /// session as it was.
    ///
    /// # Returns
    /// The stored vocabulary, if any. `PipelineBusy` if the session is training.
    pub fn restore(&self, bytes: &[u8]) -> Result<Option<Vocabulary>> {
        let _guard = TrainingGuard::acquire(&self.training)?;

        let Checkpoint {
            network,
            vocabulary,
        } = Checkpoint::decode(bytes)?;
        self.store.replace(network)?;
        Ok(vocabulary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> TrainingSession {
        let config = NetworkConfig::new(2, 2)
            .with_hidden_size(3)
            .with_window_size(1);
        TrainingSession::new(config, Some(8)).unwrap()
    }

    #[test]
    fn train_outside_runtime() {
        let session = session();
        assert!(matches!(
            session.train(PipelineConfig::default()),
            Err(RnnErr::Worker(_))
        ));
        assert!(!session.is_training());
    }

    #[test]
    fn train_step_releases_guard() {
        let session = session();
        let batch = TrainingBatch::from_indices(&[0], &[1], 2, 2).unwrap();

        session.train_step(&batch).unwrap();
        assert!(!session.is_training());
        session.train_step(&batch).unwrap();
    }

    #[test]
    fn restore_garbage_keeps_state() {
        let session = session();
        let before = session.snapshot();

        assert!(session.restore(b"not a checkpoint").is_err());
        assert_eq!(session.snapshot(), before);
        assert!(!session.is_training());
    }

    #[test]
    fn reset_hidden() {
        let session = session();
        let batch = TrainingBatch::from_indices(&[0], &[1], 2, 2).unwrap();

        session.train_step(&batch).unwrap();
        assert!(session.hidden_state().iter().any(|&h| h != 0.));

        session.reset_hidden().unwrap();
        assert!(session.hidden_state().iter().all(|&h| h == 0.));
    }
}
