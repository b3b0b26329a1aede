use log::trace;

use super::TrainingBatch;
use crate::{
    engine::cross_entropy,
    error::{Result, RnnErr},
    optimization::{GRADIENT_CLIP, clip_gradients},
    parameters::ParameterStore,
};

/// Trains the network in `store` on one batch and returns its loss.
///
/// The lock is taken for the forward pass, for backpropagation and for the commit, the rest
/// runs without it. The batch is rejected before anything is committed if it doesn't fit the
/// configuration or if the loss or any gradient isn't finite.
pub(crate) fn train_on(store: &ParameterStore, batch: &TrainingBatch) -> Result<f32> {
    batch.validate(store.config())?;

    let trace = store.read(|network| network.params().trace(batch.inputs(), network.hidden()));

    let loss = cross_entropy(&trace.probabilities, batch.targets());
    if !loss.is_finite() {
        return Err(RnnErr::NumericInstability { what: "loss" });
    }

    let mut grads = store.read(|network| {
        network
            .params()
            .back_propagation(batch.inputs(), &trace, batch.targets())
    });
    if !grads.is_finite() {
        return Err(RnnErr::NumericInstability { what: "gradients" });
    }

    clip_gradients(&mut grads, GRADIENT_CLIP);

    let hidden = trace
        .last_hidden()
        .cloned()
        .ok_or(RnnErr::SizeMismatch {
            what: "batch window",
            got: 0,
            expected: store.config().window_size,
        })?;

    store.write(|network| network.commit(hidden, &grads))?;
    trace!(loss = loss; "batch committed");
    Ok(loss)
}
