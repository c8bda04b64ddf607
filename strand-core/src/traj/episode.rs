//! One rollout's raw arrays.
use crate::error::StrandError;
use anyhow::Result;
use ndarray::{Array1, Array2};

/// One complete interaction sequence with the environment.
///
/// All fields have one entry per timestep. The raw fields (`obs`, `acs`,
/// `rews`, `dones`) are set at construction; the derived fields are filled
/// in by the transforms in [`epi_functional`](super::epi_functional) and
/// [`gae`](super::gae).
#[derive(Clone, Debug)]
pub struct Episode {
    /// Observations, one row per timestep.
    pub obs: Array2<f32>,

    /// Actions, one row per timestep.
    pub acs: Array2<f32>,

    /// Rewards.
    pub rews: Array1<f32>,

    /// Terminal flags. At most the final step is flagged.
    pub dones: Array1<i8>,

    /// Next observations, derived by [`epi_functional::add_next_obs`].
    ///
    /// [`epi_functional::add_next_obs`]: super::epi_functional::add_next_obs
    pub next_obs: Option<Array2<f32>>,

    /// Horizon masks, derived by [`epi_functional::compute_horizon_masks`].
    ///
    /// [`epi_functional::compute_horizon_masks`]: super::epi_functional::compute_horizon_masks
    pub h_masks: Option<Array1<f32>>,

    /// Advantage estimates, derived by [`gae::compute_gae`](super::gae::compute_gae).
    pub advs: Option<Array1<f32>>,

    /// Return targets, derived by [`gae::compute_gae`](super::gae::compute_gae).
    pub rets: Option<Array1<f32>>,

    /// Recurrent hidden states recorded during the rollout, if any.
    pub hs: Option<Array2<f32>>,
}

impl Episode {
    /// Constructs an episode from raw rollout arrays.
    ///
    /// Fails with [`StrandError::InvalidState`] when field lengths disagree,
    /// when the episode is empty, or when a terminal flag appears before the
    /// final step.
    pub fn new(
        obs: Array2<f32>,
        acs: Array2<f32>,
        rews: Array1<f32>,
        dones: Array1<i8>,
    ) -> Result<Self> {
        let len = obs.nrows();
        if len == 0 {
            return Err(StrandError::InvalidState("empty episode".into()).into());
        }
        for (field, l) in [
            ("acs", acs.nrows()),
            ("rews", rews.len()),
            ("dones", dones.len()),
        ] {
            if l != len {
                return Err(StrandError::InvalidState(format!(
                    "field '{}' has {} steps, 'obs' has {}",
                    field, l, len
                ))
                .into());
            }
        }
        if dones.iter().take(len - 1).any(|&d| d != 0) {
            return Err(
                StrandError::InvalidState("terminal flag before the final step".into()).into(),
            );
        }

        Ok(Self {
            obs,
            acs,
            rews,
            dones,
            next_obs: None,
            h_masks: None,
            advs: None,
            rets: None,
            hs: None,
        })
    }

    /// Attaches recorded hidden states to the episode.
    pub fn with_hs(mut self, hs: Array2<f32>) -> Result<Self> {
        if hs.nrows() != self.len() {
            return Err(StrandError::InvalidState(format!(
                "field 'hs' has {} steps, 'obs' has {}",
                hs.nrows(),
                self.len()
            ))
            .into());
        }
        self.hs = Some(hs);
        Ok(self)
    }

    /// The number of timesteps.
    pub fn len(&self) -> usize {
        self.rews.len()
    }

    /// An episode is never empty; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.rews.is_empty()
    }

    /// Whether the final step is flagged terminal.
    pub fn is_terminal(&self) -> bool {
        self.dones[self.len() - 1] == 1
    }

    /// Sum of rewards over the episode.
    pub fn ret(&self) -> f32 {
        self.rews.sum()
    }
}
