//! Trust-region policy optimization driver.
use super::{mean, shuffled_minibatches, validate_loop_args};
use crate::base::{ModelMode, StateValue, TrustRegionPolicy};
use crate::error::StrandError;
use crate::record::{Record, RecordValue::Scalar};
use crate::traj::Traj;
use anyhow::Result;
use log::info;
use ndarray::Axis;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// One TRPO iteration on a processed trajectory.
///
/// The trajectory must be registered and carry advantage estimates and
/// return targets (see [`compute_gae`](crate::traj::gae::compute_gae)).
/// The policy receives a single full-batch trust-region step; the
/// conjugate-gradient direction and the line search are the collaborator's
/// business. The value function is then fitted to the return targets over
/// `epoch` passes of shuffled minibatches (feed-forward) or shuffled whole
/// episodes (recurrent).
///
/// Returns a record with `pol_loss`, `kl` and the mean `vf_loss`.
pub fn train<P, V>(
    traj: &Traj,
    pol: &mut P,
    vf: &mut V,
    epoch: usize,
    batch_size: usize,
    seed: u64,
) -> Result<Record>
where
    P: TrustRegionPolicy,
    V: StateValue,
{
    validate_loop_args(epoch, batch_size)?;
    let flat = traj.flat_view()?;
    let advs = flat
        .advs
        .as_ref()
        .ok_or_else(|| StrandError::InvalidState("advantages are not computed".into()))?;
    let rets = flat
        .rets
        .as_ref()
        .ok_or_else(|| StrandError::InvalidState("return targets are not computed".into()))?;

    let logp_old = pol.logp(&flat.obs, &flat.acs)?;
    let (pol_loss, kl) = pol.trust_region_step(&flat.obs, &flat.acs, advs, &logp_old)?;
    info!("Policy step: surrogate loss {}, KL {}", pol_loss, kl);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut vf_losses = Vec::new();
    match vf.mode() {
        ModelMode::FeedForward => {
            for _ in 0..epoch {
                for ixs in shuffled_minibatches(flat.len(), batch_size, &mut rng)? {
                    let obs = flat.obs.select(Axis(0), &ixs);
                    let rets = rets.select(Axis(0), &ixs);
                    vf_losses.push(vf.opt_step(&obs, &rets)?);
                }
            }
        }
        ModelMode::Recurrent => {
            // Whole episodes in shuffled order; sequences are never cut.
            let mut order: Vec<usize> = (0..traj.num_epi()).collect();
            for _ in 0..epoch {
                order.shuffle(&mut rng);
                for &e in order.iter() {
                    let epi = &traj.epis()[e];
                    let rets = epi.rets.as_ref().ok_or_else(|| {
                        StrandError::InvalidState("return targets are not computed".into())
                    })?;
                    vf.reset();
                    vf_losses.push(vf.opt_step(&epi.obs, rets)?);
                }
            }
        }
    }

    let mut record = Record::empty();
    record.insert("pol_loss", Scalar(pol_loss));
    record.insert("kl", Scalar(kl));
    record.insert("vf_loss", Scalar(mean(&vf_losses)));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{ModelParams, Policy, StochasticPolicy};
    use crate::traj::{epi_functional, gae, Episode};
    use ndarray::{Array1, Array2};
    use std::path::Path;

    struct MockPol {
        steps: usize,
    }

    impl ModelParams for MockPol {
        fn save_params(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    impl Policy for MockPol {
        fn sample(&mut self, obs: &Array2<f32>) -> Result<Array2<f32>> {
            Ok(Array2::zeros((obs.nrows(), 1)))
        }
    }

    impl StochasticPolicy for MockPol {
        fn sample_with_logp(&mut self, obs: &Array2<f32>) -> Result<(Array2<f32>, Array1<f32>)> {
            Ok((Array2::zeros((obs.nrows(), 1)), Array1::zeros(obs.nrows())))
        }

        fn logp(&self, obs: &Array2<f32>, _acs: &Array2<f32>) -> Result<Array1<f32>> {
            Ok(Array1::zeros(obs.nrows()))
        }
    }

    impl TrustRegionPolicy for MockPol {
        fn trust_region_step(
            &mut self,
            obs: &Array2<f32>,
            _acs: &Array2<f32>,
            advs: &Array1<f32>,
            logp_old: &Array1<f32>,
        ) -> Result<(f32, f32)> {
            assert_eq!(obs.nrows(), advs.len());
            assert_eq!(obs.nrows(), logp_old.len());
            self.steps += 1;
            Ok((0.5, 0.01))
        }
    }

    struct MockVf {
        opt_steps: usize,
        mode: ModelMode,
    }

    impl ModelParams for MockVf {
        fn save_params(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    impl StateValue for MockVf {
        fn mode(&self) -> ModelMode {
            self.mode
        }

        fn values(&self, obs: &Array2<f32>) -> Result<Array1<f32>> {
            Ok(Array1::zeros(obs.nrows()))
        }

        fn opt_step(&mut self, obs: &Array2<f32>, rets: &Array1<f32>) -> Result<f32> {
            assert_eq!(obs.nrows(), rets.len());
            self.opt_steps += 1;
            Ok(0.1)
        }
    }

    fn processed_traj(lens: &[usize]) -> Traj {
        let mut traj = Traj::new(2, 1);
        let epis = lens
            .iter()
            .map(|&l| {
                let mut dones = Array1::zeros(l);
                dones[l - 1] = 1;
                Episode::new(
                    Array2::zeros((l, 2)),
                    Array2::zeros((l, 1)),
                    Array1::from_elem(l, 1.0),
                    dones,
                )
                .unwrap()
            })
            .collect();
        traj.add_epis(epis).unwrap();
        let traj = epi_functional::add_next_obs(traj).unwrap();
        let vf = MockVf {
            opt_steps: 0,
            mode: ModelMode::FeedForward,
        };
        let mut traj = gae::compute_gae(traj, &vf, 0.99, 0.95, true).unwrap();
        traj.register().unwrap();
        traj
    }

    #[test]
    fn test_train_feed_forward() {
        let traj = processed_traj(&[6, 4]);
        let mut pol = MockPol { steps: 0 };
        let mut vf = MockVf {
            opt_steps: 0,
            mode: ModelMode::FeedForward,
        };
        let record = train(&traj, &mut pol, &mut vf, 3, 4, 0).unwrap();
        // One policy step; ceil(10 / 4) = 3 minibatches per epoch.
        assert_eq!(pol.steps, 1);
        assert_eq!(vf.opt_steps, 3 * 3);
        assert_eq!(record.get_scalar("pol_loss").unwrap(), 0.5);
        assert_eq!(record.get_scalar("kl").unwrap(), 0.01);
        assert!((record.get_scalar("vf_loss").unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_train_recurrent_consumes_whole_episodes() {
        let traj = processed_traj(&[6, 4, 2]);
        let mut pol = MockPol { steps: 0 };
        let mut vf = MockVf {
            opt_steps: 0,
            mode: ModelMode::Recurrent,
        };
        train(&traj, &mut pol, &mut vf, 2, 4, 0).unwrap();
        // One opt step per episode per epoch, regardless of batch_size.
        assert_eq!(vf.opt_steps, 2 * 3);
    }

    #[test]
    fn test_train_requires_advantages() {
        let mut traj = Traj::new(2, 1);
        let mut dones = Array1::zeros(3);
        dones[2] = 1;
        traj.add_epis(vec![Episode::new(
            Array2::zeros((3, 2)),
            Array2::zeros((3, 1)),
            Array1::zeros(3),
            dones,
        )
        .unwrap()])
            .unwrap();
        traj.register().unwrap();
        let mut pol = MockPol { steps: 0 };
        let mut vf = MockVf {
            opt_steps: 0,
            mode: ModelMode::FeedForward,
        };
        assert!(train(&traj, &mut pol, &mut vf, 1, 4, 0).is_err());
    }

    #[test]
    fn test_train_rejects_zero_epoch() {
        let traj = processed_traj(&[4]);
        let mut pol = MockPol { steps: 0 };
        let mut vf = MockVf {
            opt_steps: 0,
            mode: ModelMode::FeedForward,
        };
        assert!(train(&traj, &mut pol, &mut vf, 0, 4, 0).is_err());
    }
}
