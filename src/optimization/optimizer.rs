use crate::{error::Result, parameters::{Gradients, Parameters}};

/// Defines the strategy for updating the network's parameters based on calculated gradients.
pub trait Optimizer {
    /// Updates `params` in place using `grad`.
    ///
    /// # Arguments
    /// * `grad` - The gradients of the last window.
    /// * `params` - The parameters to update.
    ///
    /// # Returns
    /// An error if the shapes of `grad`, `params` and the optimizer's state disagree.
    fn update_params(&mut self, grad: &Gradients, params: &mut Parameters) -> Result<()>;
}
