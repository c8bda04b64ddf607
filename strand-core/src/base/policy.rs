//! Policy interfaces.
use super::ModelMode;
use anyhow::Result;
use ndarray::{Array1, Array2};

/// A policy on an environment.
///
/// A policy is a mapping from a batch of observations to a batch of actions.
/// The mapping can be either deterministic (e.g., a planning policy over a
/// learned dynamics model) or stochastic.
pub trait Policy {
    /// Returns how the policy consumes observations.
    fn mode(&self) -> ModelMode {
        ModelMode::FeedForward
    }

    /// Samples actions for a batch of observations, one row per observation.
    fn sample(&mut self, obs: &Array2<f32>) -> Result<Array2<f32>>;

    /// Resets recurrent hidden state. No-op for feed-forward policies.
    fn reset(&mut self) {}
}

/// A stochastic policy exposing action log-probabilities.
pub trait StochasticPolicy: Policy {
    /// Samples actions and returns their log-probabilities as well.
    fn sample_with_logp(&mut self, obs: &Array2<f32>) -> Result<(Array2<f32>, Array1<f32>)>;

    /// Log-probabilities of the given actions under the current parameters.
    fn logp(&self, obs: &Array2<f32>, acs: &Array2<f32>) -> Result<Array1<f32>>;
}

/// A stochastic policy that can perform a KL-constrained update.
///
/// The conjugate-gradient direction and the line search live behind this
/// trait; the TRPO driver only hands over the full batch and reads back the
/// diagnostics.
pub trait TrustRegionPolicy: StochasticPolicy + super::ModelParams {
    /// One trust-region update on a full batch.
    ///
    /// `logp_old` holds the log-probabilities of `acs` under the parameters
    /// before the update, used for the surrogate objective ratio. Returns
    /// the surrogate loss and the KL estimate after the update.
    fn trust_region_step(
        &mut self,
        obs: &Array2<f32>,
        acs: &Array2<f32>,
        advs: &Array1<f32>,
        logp_old: &Array1<f32>,
    ) -> Result<(f32, f32)>;
}
