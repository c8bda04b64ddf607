//! Normalization statistics carried across aggregation iterations.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Standard deviations are floored at this value to avoid division by zero.
pub(crate) const STD_EPS: f32 = 1e-6;

/// Per-dimension mean and standard deviation of observations and actions.
///
/// The statistics are computed once from an initial dataset and then reused,
/// never recomputed, when normalizing newly collected episodes. This keeps
/// the model's input distribution consistent across aggregation iterations
/// even as the underlying state distribution shifts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NormalizeStats {
    /// Mean observation.
    pub mean_obs: Array1<f32>,

    /// Observation standard deviation, floored.
    pub std_obs: Array1<f32>,

    /// Mean action.
    pub mean_acs: Array1<f32>,

    /// Action standard deviation, floored.
    pub std_acs: Array1<f32>,
}

impl NormalizeStats {
    /// Maps normalized observations back to the original scale.
    pub fn denormalize_obs(&self, obs: &Array2<f32>) -> Array2<f32> {
        obs * &self.std_obs + &self.mean_obs
    }

    /// Maps normalized actions back to the original scale.
    pub fn denormalize_acs(&self, acs: &Array2<f32>) -> Array2<f32> {
        acs * &self.std_acs + &self.mean_acs
    }
}
