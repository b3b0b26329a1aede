//! The forward pass, the loss and backpropagation through time of the recurrent network.

mod backward;
mod forward;
mod loss;

pub use forward::ForwardTrace;
pub use loss::{cross_entropy, softmax_rows};
