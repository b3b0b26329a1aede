use std::sync::Arc;

use ndarray::Array1;
use parking_lot::Mutex;

use super::{Network, Parameters};
use crate::{
    config::NetworkConfig,
    error::{Result, RnnErr},
};

/// A private copy of the weights and hidden state, taken atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub params: Parameters,
    pub hidden: Array1<f32>,
}

/// Shares one `Network` between the training worker and its readers.
///
/// A single lock guards the whole network, so readers never see a half applied update. The
/// lock is never handed out, callers go through closures and snapshots.
#[derive(Debug)]
pub struct ParameterStore {
    config: Arc<NetworkConfig>,
    network: Arc<Mutex<Network>>,
}

impl Clone for ParameterStore {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            network: Arc::clone(&self.network),
        }
    }
}

impl ParameterStore {
    /// Creates a new `ParameterStore` owning `network`.
    pub fn new(network: Network) -> Self {
        Self {
            config: Arc::new(network.config().clone()),
            network: Arc::new(Mutex::new(network)),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Copies the weights and hidden state under the lock.
    pub fn snapshot(&self) -> Snapshot {
        self.read(|network| Snapshot {
            params: network.params().clone(),
            hidden: network.hidden().to_owned(),
        })
    }

    pub fn hidden(&self) -> Array1<f32> {
        self.read(|network| network.hidden().to_owned())
    }

    pub fn reset_hidden(&self) {
        self.write(Network::reset_hidden);
    }

    /// Runs `f` with shared access to the network.
    pub fn read<T>(&self, f: impl FnOnce(&Network) -> T) -> T {
        f(&self.network.lock())
    }

    /// Runs `f` with exclusive access to the network.
    pub fn write<T>(&self, f: impl FnOnce(&mut Network) -> T) -> T {
        f(&mut self.network.lock())
    }

    /// Swaps the whole network for `network`.
    ///
    /// # Returns
    /// An error, leaving the store untouched, if `network` was built from another configuration.
    pub fn replace(&self, network: Network) -> Result<()> {
        if network.config() != self.config() {
            return Err(RnnErr::InvalidConfig(
                "the restored network has a different configuration".into(),
            ));
        }

        self.write(|current| *current = network);
        Ok(())
    }
}
