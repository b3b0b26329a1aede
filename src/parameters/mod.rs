mod network;
mod params;
mod store;

pub use network::Network;
pub use params::{Gradients, Parameters};
pub use store::{ParameterStore, Snapshot};
