//! Forward dynamics model interface.
use super::{ModelMode, ModelParams};
use anyhow::Result;
use ndarray::Array2;

/// A forward dynamics model `f(s, a) -> s'`.
pub trait DynamicsModel: ModelParams {
    /// Returns how the model consumes transitions.
    fn mode(&self) -> ModelMode {
        ModelMode::FeedForward
    }

    /// Predicted next observations for a batch of transitions.
    fn predict(&self, obs: &Array2<f32>, acs: &Array2<f32>) -> Result<Array2<f32>>;

    /// One supervised regression step on `(obs, acs) -> next_obs` targets.
    ///
    /// Returns the regression loss before the step.
    fn opt_step(
        &mut self,
        obs: &Array2<f32>,
        acs: &Array2<f32>,
        next_obs: &Array2<f32>,
    ) -> Result<f32>;

    /// Resets recurrent hidden state before consuming a new sequence.
    fn reset(&mut self) {}
}
