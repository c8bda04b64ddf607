//! Trajectory store with a registered flat view.
use super::Episode;
use crate::error::StrandError;
use anyhow::Result;
use ndarray::{s, Array1, Array2, Axis};

/// An ordered collection of episodes processed together for training.
///
/// A trajectory is constructed against a declared observation/action space;
/// every added episode is validated against those dimensionalities. The flat
/// concatenated view is only built by an explicit [`Traj::register`] call,
/// and any mutation (adding episodes, merging, applying a transform)
/// invalidates it until the next `register`.
pub struct Traj {
    obs_dim: usize,
    ac_dim: usize,
    epis: Vec<Episode>,
    flat: Option<FlatView>,
}

impl Traj {
    /// Creates an empty trajectory over the given observation/action space.
    pub fn new(obs_dim: usize, ac_dim: usize) -> Self {
        Self {
            obs_dim,
            ac_dim,
            epis: Vec::new(),
            flat: None,
        }
    }

    /// The declared observation dimensionality.
    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    /// The declared action dimensionality.
    pub fn ac_dim(&self) -> usize {
        self.ac_dim
    }

    /// Appends episodes. Does not register the flat view.
    ///
    /// Fails with [`StrandError::ShapeMismatch`] when an episode's field
    /// dimensionality disagrees with the declared space.
    pub fn add_epis(&mut self, epis: Vec<Episode>) -> Result<()> {
        for epi in epis.iter() {
            if epi.obs.ncols() != self.obs_dim {
                return Err(StrandError::ShapeMismatch {
                    field: "obs".into(),
                    expected: self.obs_dim,
                    actual: epi.obs.ncols(),
                }
                .into());
            }
            if epi.acs.ncols() != self.ac_dim {
                return Err(StrandError::ShapeMismatch {
                    field: "acs".into(),
                    expected: self.ac_dim,
                    actual: epi.acs.ncols(),
                }
                .into());
            }
            if let Some(next_obs) = &epi.next_obs {
                if next_obs.ncols() != self.obs_dim {
                    return Err(StrandError::ShapeMismatch {
                        field: "next_obs".into(),
                        expected: self.obs_dim,
                        actual: next_obs.ncols(),
                    }
                    .into());
                }
            }
        }
        self.epis.extend(epis);
        self.flat = None;
        Ok(())
    }

    /// Appends another trajectory's episodes.
    ///
    /// The flat view is invalidated until the next [`Traj::register`].
    pub fn merge(&mut self, other: Traj) -> Result<()> {
        if other.obs_dim != self.obs_dim {
            return Err(StrandError::ShapeMismatch {
                field: "obs".into(),
                expected: self.obs_dim,
                actual: other.obs_dim,
            }
            .into());
        }
        if other.ac_dim != self.ac_dim {
            return Err(StrandError::ShapeMismatch {
                field: "acs".into(),
                expected: self.ac_dim,
                actual: other.ac_dim,
            }
            .into());
        }
        self.epis.extend(other.epis);
        self.flat = None;
        Ok(())
    }

    /// The number of episodes.
    pub fn num_epi(&self) -> usize {
        self.epis.len()
    }

    /// The total number of timesteps across all episodes.
    pub fn num_step(&self) -> usize {
        self.epis.iter().map(|e| e.len()).sum()
    }

    /// The episodes, in insertion order.
    pub fn epis(&self) -> &[Episode] {
        &self.epis
    }

    /// Iterates over episodes for sequence-batched (recurrent) consumption.
    pub fn iter_epis(&self) -> std::slice::Iter<Episode> {
        self.epis.iter()
    }

    pub(crate) fn epis_mut(&mut self) -> &mut [Episode] {
        &mut self.epis
    }

    /// Clears the flat view. Called by transforms after mutating episodes.
    pub(crate) fn invalidate(&mut self) {
        self.flat = None;
    }

    /// Whether the flat view is currently registered.
    pub fn is_registered(&self) -> bool {
        self.flat.is_some()
    }

    /// Builds the flat concatenated view and its flat-to-episode index.
    ///
    /// Fails with [`StrandError::InvalidState`] when the trajectory is empty
    /// or when episodes carry inconsistent sets of derived fields (e.g.,
    /// `next_obs` on some episodes but not on others).
    pub fn register(&mut self) -> Result<()> {
        if self.epis.is_empty() {
            return Err(StrandError::InvalidState("no episodes to register".into()).into());
        }
        for field in ["next_obs", "h_masks", "advs", "rets"] {
            let has = |e: &Episode| match field {
                "next_obs" => e.next_obs.is_some(),
                "h_masks" => e.h_masks.is_some(),
                "advs" => e.advs.is_some(),
                _ => e.rets.is_some(),
            };
            let first = has(&self.epis[0]);
            if self.epis.iter().any(|e| has(e) != first) {
                return Err(StrandError::InvalidState(format!(
                    "field '{}' is present on some episodes but not on others",
                    field
                ))
                .into());
            }
        }

        let num_step = self.num_step();
        let has_next_obs = self.epis[0].next_obs.is_some();
        let has_h_masks = self.epis[0].h_masks.is_some();
        let has_advs = self.epis[0].advs.is_some();
        let has_rets = self.epis[0].rets.is_some();

        let mut obs = Array2::zeros((num_step, self.obs_dim));
        let mut acs = Array2::zeros((num_step, self.ac_dim));
        let mut rews = Array1::zeros(num_step);
        let mut dones = Array1::zeros(num_step);
        let mut next_obs = has_next_obs.then(|| Array2::zeros((num_step, self.obs_dim)));
        let mut h_masks = has_h_masks.then(|| Array1::zeros(num_step));
        let mut advs = has_advs.then(|| Array1::zeros(num_step));
        let mut rets = has_rets.then(|| Array1::zeros(num_step));
        let mut index = Vec::with_capacity(num_step);

        let mut ofs = 0;
        for (i, epi) in self.epis.iter().enumerate() {
            let l = epi.len();
            obs.slice_mut(s![ofs..ofs + l, ..]).assign(&epi.obs);
            acs.slice_mut(s![ofs..ofs + l, ..]).assign(&epi.acs);
            rews.slice_mut(s![ofs..ofs + l]).assign(&epi.rews);
            dones.slice_mut(s![ofs..ofs + l]).assign(&epi.dones);
            if let (Some(dst), Some(src)) = (next_obs.as_mut(), epi.next_obs.as_ref()) {
                dst.slice_mut(s![ofs..ofs + l, ..]).assign(src);
            }
            if let (Some(dst), Some(src)) = (h_masks.as_mut(), epi.h_masks.as_ref()) {
                dst.slice_mut(s![ofs..ofs + l]).assign(src);
            }
            if let (Some(dst), Some(src)) = (advs.as_mut(), epi.advs.as_ref()) {
                dst.slice_mut(s![ofs..ofs + l]).assign(src);
            }
            if let (Some(dst), Some(src)) = (rets.as_mut(), epi.rets.as_ref()) {
                dst.slice_mut(s![ofs..ofs + l]).assign(src);
            }
            index.extend((0..l).map(|t| (i, t)));
            ofs += l;
        }

        self.flat = Some(FlatView {
            obs,
            acs,
            rews,
            dones,
            next_obs,
            h_masks,
            advs,
            rets,
            index,
        });
        Ok(())
    }

    /// The registered flat view.
    ///
    /// Fails with [`StrandError::InvalidState`] when [`Traj::register`] has
    /// not been called since the last mutation.
    pub fn flat_view(&self) -> Result<&FlatView> {
        self.flat
            .as_ref()
            .ok_or_else(|| StrandError::InvalidState("trajectory is not registered".into()).into())
    }
}

/// Flat concatenation of all episodes' per-field sequences.
pub struct FlatView {
    /// Observations over all episodes.
    pub obs: Array2<f32>,

    /// Actions over all episodes.
    pub acs: Array2<f32>,

    /// Rewards over all episodes.
    pub rews: Array1<f32>,

    /// Terminal flags over all episodes.
    pub dones: Array1<i8>,

    /// Next observations, when registered on all episodes.
    pub next_obs: Option<Array2<f32>>,

    /// Horizon masks, when registered on all episodes.
    pub h_masks: Option<Array1<f32>>,

    /// Advantage estimates, when registered on all episodes.
    pub advs: Option<Array1<f32>>,

    /// Return targets, when registered on all episodes.
    pub rets: Option<Array1<f32>>,

    index: Vec<(usize, usize)>,
}

impl FlatView {
    /// The total number of timesteps in the view.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the view is empty. Registration rejects empty trajectories,
    /// so this is false for any registered view.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Resolves a flat position to its source `(episode index, offset)`.
    pub fn lookup(&self, flat_ix: usize) -> Option<(usize, usize)> {
        self.index.get(flat_ix).copied()
    }

    /// Gathers the given rows into a minibatch.
    pub fn select(&self, ixs: &[usize]) -> FlatBatch {
        FlatBatch {
            obs: self.obs.select(Axis(0), ixs),
            acs: self.acs.select(Axis(0), ixs),
            rews: self.rews.select(Axis(0), ixs),
            dones: self.dones.select(Axis(0), ixs),
            next_obs: self.next_obs.as_ref().map(|a| a.select(Axis(0), ixs)),
            h_masks: self.h_masks.as_ref().map(|a| a.select(Axis(0), ixs)),
            advs: self.advs.as_ref().map(|a| a.select(Axis(0), ixs)),
            rets: self.rets.as_ref().map(|a| a.select(Axis(0), ixs)),
        }
    }
}

/// A row-gathered minibatch taken from a [`FlatView`].
pub struct FlatBatch {
    /// Observations.
    pub obs: Array2<f32>,

    /// Actions.
    pub acs: Array2<f32>,

    /// Rewards.
    pub rews: Array1<f32>,

    /// Terminal flags.
    pub dones: Array1<i8>,

    /// Next observations, when present in the source view.
    pub next_obs: Option<Array2<f32>>,

    /// Horizon masks, when present in the source view.
    pub h_masks: Option<Array1<f32>>,

    /// Advantage estimates, when present in the source view.
    pub advs: Option<Array1<f32>>,

    /// Return targets, when present in the source view.
    pub rets: Option<Array1<f32>>,
}

impl FlatBatch {
    /// The number of rows in the minibatch.
    pub fn len(&self) -> usize {
        self.rews.len()
    }

    /// Whether the minibatch is empty.
    pub fn is_empty(&self) -> bool {
        self.rews.is_empty()
    }
}
