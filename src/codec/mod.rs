//! Text to symbol indices to one-hot vectors, and text to training batches.

mod feeder;
mod vocabulary;

pub use feeder::TextFeeder;
pub use vocabulary::Vocabulary;
