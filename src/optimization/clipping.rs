use rayon::prelude::*;

use crate::parameters::Gradients;

/// Gradients are clamped to `[-GRADIENT_CLIP, GRADIENT_CLIP]` before every update.
pub const GRADIENT_CLIP: f32 = 5.;

/// Clamps every element of the five gradient arrays to `[-bound, bound]`.
///
/// The arrays are clipped in parallel and all of them are done when this returns.
pub fn clip_gradients(grads: &mut Gradients, bound: f32) {
    grads
        .views_mut()
        .into_par_iter()
        .for_each(|mut view| view.mapv_inplace(|g| g.clamp(-bound, bound)));
}
