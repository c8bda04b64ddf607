//! Pure, composable transforms over trajectories.
//!
//! Every transform consumes the trajectory and returns it with an added or
//! modified field, so no mutable state is shared between the pre- and
//! post-transform trajectory. The flat view is invalidated; call
//! [`Traj::register`] after the pipeline.
use super::stats::STD_EPS;
use super::{NormalizeStats, Traj};
use crate::error::StrandError;
use anyhow::Result;
use ndarray::{s, Array1, Array2, Axis};

/// Derives a `next_obs` sequence by shifting `obs` one step forward.
///
/// The final timestep's `next_obs` repeats the final observation, so
/// downstream consumers never index out of bounds.
pub fn add_next_obs(mut traj: Traj) -> Result<Traj> {
    for epi in traj.epis_mut() {
        let l = epi.len();
        let mut next = Array2::zeros((l, epi.obs.ncols()));
        if l > 1 {
            next.slice_mut(s![..l - 1, ..]).assign(&epi.obs.slice(s![1.., ..]));
        }
        next.row_mut(l - 1).assign(&epi.obs.row(l - 1));
        epi.next_obs = Some(next);
    }
    traj.invalidate();
    Ok(traj)
}

/// Marks timesteps that have at least `horizon` valid future steps remaining
/// in the same episode.
///
/// For an episode of length `L`, timestep `i` gets mask 1 iff
/// `i + horizon <= L`; episodes shorter than `horizon` get all-zero masks.
/// Planning with a fixed lookahead window must never read past an episode's
/// end, which these masks enforce.
pub fn compute_horizon_masks(mut traj: Traj, horizon: usize) -> Result<Traj> {
    if horizon == 0 {
        return Err(StrandError::InvalidArgument("horizon must be positive".into()).into());
    }
    for epi in traj.epis_mut() {
        let l = epi.len();
        let mask = Array1::from_shape_fn(l, |i| if i + horizon <= l { 1.0 } else { 0.0 });
        epi.h_masks = Some(mask);
    }
    traj.invalidate();
    Ok(traj)
}

/// Normalizes observations and actions to mean 0 and standard deviation 1.
///
/// When `stats` is `None`, per-dimension mean and standard deviation are
/// computed over all timesteps of the trajectory (standard deviation floored
/// at a small epsilon) and applied in place. When `stats` is given, it is
/// applied without recomputation, guaranteeing identical normalization
/// across aggregation rounds regardless of the new data's distribution
/// shift. `next_obs`, when present, is normalized with the observation
/// statistics.
///
/// Returns the trajectory together with the statistics that were applied.
pub fn normalize_obs_and_acs(
    mut traj: Traj,
    stats: Option<&NormalizeStats>,
) -> Result<(Traj, NormalizeStats)> {
    if traj.num_step() == 0 {
        return Err(StrandError::InvalidState("no episodes to normalize".into()).into());
    }
    if let Some(stats) = stats {
        validate_stats_dims(&traj, stats)?;
    }

    let stats = match stats {
        Some(stats) => stats.clone(),
        None => compute_stats(&traj),
    };

    for epi in traj.epis_mut() {
        epi.obs = (&epi.obs - &stats.mean_obs) / &stats.std_obs;
        epi.acs = (&epi.acs - &stats.mean_acs) / &stats.std_acs;
        if let Some(next_obs) = epi.next_obs.take() {
            epi.next_obs = Some((next_obs - &stats.mean_obs) / &stats.std_obs);
        }
    }
    traj.invalidate();
    Ok((traj, stats))
}

fn validate_stats_dims(traj: &Traj, stats: &NormalizeStats) -> Result<()> {
    if stats.mean_obs.len() != traj.obs_dim() {
        return Err(StrandError::ShapeMismatch {
            field: "mean_obs".into(),
            expected: traj.obs_dim(),
            actual: stats.mean_obs.len(),
        }
        .into());
    }
    if stats.mean_acs.len() != traj.ac_dim() {
        return Err(StrandError::ShapeMismatch {
            field: "mean_acs".into(),
            expected: traj.ac_dim(),
            actual: stats.mean_acs.len(),
        }
        .into());
    }
    Ok(())
}

fn compute_stats(traj: &Traj) -> NormalizeStats {
    let n = traj.num_step() as f32;

    let mut mean_obs = Array1::zeros(traj.obs_dim());
    let mut mean_acs = Array1::zeros(traj.ac_dim());
    for epi in traj.iter_epis() {
        mean_obs += &epi.obs.sum_axis(Axis(0));
        mean_acs += &epi.acs.sum_axis(Axis(0));
    }
    mean_obs /= n;
    mean_acs /= n;

    let mut var_obs = Array1::zeros(traj.obs_dim());
    let mut var_acs = Array1::zeros(traj.ac_dim());
    for epi in traj.iter_epis() {
        let d_obs = &epi.obs - &mean_obs;
        let d_acs = &epi.acs - &mean_acs;
        var_obs += &(&d_obs * &d_obs).sum_axis(Axis(0));
        var_acs += &(&d_acs * &d_acs).sum_axis(Axis(0));
    }
    let std_obs = (var_obs / n).mapv(|v: f32| v.sqrt().max(STD_EPS));
    let std_acs = (var_acs / n).mapv(|v: f32| v.sqrt().max(STD_EPS));

    NormalizeStats {
        mean_obs,
        std_obs,
        mean_acs,
        std_acs,
    }
}
