//! Generalized Advantage Estimation.
use super::stats::STD_EPS;
use super::Traj;
use crate::base::StateValue;
use crate::error::StrandError;
use anyhow::Result;
use ndarray::Array1;

/// Computes per-step advantage estimates and return targets.
///
/// For each episode, the backward recursion
///
/// ```text
/// delta[t] = rew[t] + gamma * V(obs[t+1]) * (1 - done[t]) - V(obs[t])
/// adv[t]   = delta[t] + gamma * lambda * adv[t+1] * (1 - done[t])
/// ret[t]   = adv[t] + V(obs[t])
/// ```
///
/// is evaluated with `adv` after the last step taken as 0. Episodes are
/// processed independently; the `(1 - done[t])` factor plus the per-episode
/// iteration keep estimates from leaking across episode boundaries.
///
/// `V(obs[t+1])` is read from the stitched `next_obs` field, so
/// [`add_next_obs`](super::epi_functional::add_next_obs) must have run
/// first. With `centering`, advantages are shifted to mean 0 and scaled to
/// standard deviation 1 over the whole trajectory (after the return targets
/// are computed), for variance reduction.
///
/// `gamma` and `lambda` outside `[0, 1]` fail with
/// [`StrandError::InvalidArgument`].
pub fn compute_gae<V: StateValue>(
    mut traj: Traj,
    vf: &V,
    gamma: f32,
    lambda: f32,
    centering: bool,
) -> Result<Traj> {
    for (name, v) in [("gamma", gamma), ("lambda", lambda)] {
        if !(0.0..=1.0).contains(&v) {
            return Err(StrandError::InvalidArgument(format!(
                "{} must be in [0, 1], got {}",
                name, v
            ))
            .into());
        }
    }

    for epi in traj.epis_mut() {
        let l = epi.len();
        let next_obs = epi.next_obs.as_ref().ok_or_else(|| {
            StrandError::InvalidState("next_obs is missing; apply add_next_obs first".into())
        })?;

        let vs = vf.values(&epi.obs)?;
        let next_vs = vf.values(next_obs)?;
        for (field, len) in [("values", vs.len()), ("next values", next_vs.len())] {
            if len != l {
                return Err(StrandError::ShapeMismatch {
                    field: field.into(),
                    expected: l,
                    actual: len,
                }
                .into());
            }
        }

        let mut advs = Array1::zeros(l);
        let mut adv = 0f32;
        for t in (0..l).rev() {
            let nonterminal = 1.0 - epi.dones[t] as f32;
            let delta = epi.rews[t] + gamma * next_vs[t] * nonterminal - vs[t];
            adv = delta + gamma * lambda * adv * nonterminal;
            advs[t] = adv;
        }
        epi.rets = Some(&advs + &vs);
        epi.advs = Some(advs);
    }

    if centering {
        center_advs(&mut traj);
    }

    traj.invalidate();
    Ok(traj)
}

/// Shifts advantages to mean 0 and scales to std 1 over the whole dataset.
fn center_advs(traj: &mut Traj) {
    let n = traj.num_step() as f32;
    let mut sum = 0f32;
    for epi in traj.iter_epis() {
        if let Some(advs) = &epi.advs {
            sum += advs.sum();
        }
    }
    let mean = sum / n;

    let mut var = 0f32;
    for epi in traj.iter_epis() {
        if let Some(advs) = &epi.advs {
            var += advs.mapv(|a| (a - mean) * (a - mean)).sum();
        }
    }
    let std = (var / n).sqrt().max(STD_EPS);

    for epi in traj.epis_mut() {
        if let Some(advs) = epi.advs.take() {
            epi.advs = Some(advs.mapv(|a| (a - mean) / std));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ModelParams;
    use crate::traj::{epi_functional, Episode};
    use ndarray::{Array1, Array2};
    use std::path::Path;

    /// A value function returning a constant for every observation.
    struct ConstV(f32);

    impl ModelParams for ConstV {
        fn save_params(&self, _path: &Path) -> anyhow::Result<()> {
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl StateValue for ConstV {
        fn values(&self, obs: &Array2<f32>) -> anyhow::Result<Array1<f32>> {
            Ok(Array1::from_elem(obs.nrows(), self.0))
        }

        fn opt_step(&mut self, _obs: &Array2<f32>, _rets: &Array1<f32>) -> anyhow::Result<f32> {
            Ok(0.0)
        }
    }

    fn single_step_traj(rew: f32) -> Traj {
        let mut traj = Traj::new(1, 1);
        let epi = Episode::new(
            Array2::zeros((1, 1)),
            Array2::zeros((1, 1)),
            Array1::from_vec(vec![rew]),
            Array1::from_vec(vec![1]),
        )
        .unwrap();
        traj.add_epis(vec![epi]).unwrap();
        traj
    }

    #[test]
    fn test_single_step_boundary() {
        // For a terminal single-step episode, adv = r - V(obs) and ret = r.
        let v = 0.7f32;
        let r = 2.5f32;
        let traj = epi_functional::add_next_obs(single_step_traj(r)).unwrap();
        let traj = compute_gae(traj, &ConstV(v), 0.99, 0.95, false).unwrap();
        let epi = &traj.epis()[0];
        let adv = epi.advs.as_ref().unwrap()[0];
        let ret = epi.rets.as_ref().unwrap()[0];
        assert!((adv - (r - v)).abs() < 1e-6);
        assert!((ret - r).abs() < 1e-6);
    }

    #[test]
    fn test_requires_next_obs() {
        let traj = single_step_traj(1.0);
        assert!(compute_gae(traj, &ConstV(0.0), 0.99, 0.95, false).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_params() {
        for (gamma, lambda) in [(1.5f32, 0.9f32), (-0.1, 0.9), (0.9, 1.5), (0.9, -0.1)] {
            let traj = epi_functional::add_next_obs(single_step_traj(1.0)).unwrap();
            assert!(compute_gae(traj, &ConstV(0.0), gamma, lambda, false).is_err());
        }
    }

    #[test]
    fn test_no_leakage_across_episodes() {
        // Two identical terminal episodes must get identical estimates,
        // whatever precedes or follows them in the trajectory.
        let make_epi = || {
            Episode::new(
                Array2::zeros((3, 1)),
                Array2::zeros((3, 1)),
                Array1::from_vec(vec![1.0, 2.0, 3.0]),
                Array1::from_vec(vec![0, 0, 1]),
            )
            .unwrap()
        };
        let mut traj = Traj::new(1, 1);
        traj.add_epis(vec![make_epi(), make_epi()]).unwrap();
        let traj = epi_functional::add_next_obs(traj).unwrap();
        let traj = compute_gae(traj, &ConstV(0.5), 0.9, 0.8, false).unwrap();
        let a0 = traj.epis()[0].advs.as_ref().unwrap();
        let a1 = traj.epis()[1].advs.as_ref().unwrap();
        assert_eq!(a0, a1);

        // Hand-rolled recursion for one episode.
        let gamma = 0.9f32;
        let lambda = 0.8f32;
        let v = 0.5f32;
        let rews = [1.0f32, 2.0, 3.0];
        let mut expected = [0f32; 3];
        let mut adv = 0f32;
        for t in (0..3).rev() {
            let nonterminal = if t == 2 { 0.0 } else { 1.0 };
            let delta = rews[t] + gamma * v * nonterminal - v;
            adv = delta + gamma * lambda * adv * nonterminal;
            expected[t] = adv;
        }
        for t in 0..3 {
            assert!((a0[t] - expected[t]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_centering_statistics() {
        let mut traj = Traj::new(1, 1);
        let epi = Episode::new(
            Array2::zeros((4, 1)),
            Array2::zeros((4, 1)),
            Array1::from_vec(vec![1.0, -2.0, 3.0, 0.5]),
            Array1::from_vec(vec![0, 0, 0, 1]),
        )
        .unwrap();
        traj.add_epis(vec![epi]).unwrap();
        let traj = epi_functional::add_next_obs(traj).unwrap();
        let traj = compute_gae(traj, &ConstV(0.0), 0.99, 0.95, true).unwrap();
        let advs = traj.epis()[0].advs.as_ref().unwrap();
        let mean = advs.sum() / 4.0;
        let var = advs.mapv(|a| (a - mean) * (a - mean)).sum() / 4.0;
        assert!(mean.abs() < 1e-5);
        assert!((var.sqrt() - 1.0).abs() < 1e-4);
    }
}
