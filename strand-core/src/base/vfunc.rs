//! State-value function interface.
use super::{ModelMode, ModelParams};
use anyhow::Result;
use ndarray::{Array1, Array2};

/// A fitted state-value function `V(s)`.
pub trait StateValue: ModelParams {
    /// Returns how the value function consumes observations.
    fn mode(&self) -> ModelMode {
        ModelMode::FeedForward
    }

    /// Value estimates for a batch of observations.
    fn values(&self, obs: &Array2<f32>) -> Result<Array1<f32>>;

    /// One gradient step towards the given return targets.
    ///
    /// Returns the regression loss before the step.
    fn opt_step(&mut self, obs: &Array2<f32>, rets: &Array1<f32>) -> Result<f32>;

    /// Resets recurrent hidden state. No-op for feed-forward models.
    fn reset(&mut self) {}
}
