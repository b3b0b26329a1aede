mod adagrad;
mod clipping;
mod optimizer;

pub use adagrad::Adagrad;
pub use clipping::{GRADIENT_CLIP, clip_gradients};
pub use optimizer::Optimizer;
