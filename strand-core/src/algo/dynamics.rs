//! Forward dynamics model training driver.
use super::{mean, shuffled_minibatches, validate_loop_args};
use crate::base::{DynamicsModel, ModelMode};
use crate::error::StrandError;
use crate::record::{Record, RecordValue};
use crate::traj::Traj;
use anyhow::Result;
use log::info;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Trains a forward dynamics model on `(obs, acs) -> next_obs` targets.
///
/// Ordinary supervised regression over `epoch` passes of shuffled
/// minibatches (feed-forward) or shuffled whole episodes (recurrent); no
/// trust-region constraint. The trajectory must be registered and carry the
/// stitched `next_obs` field.
///
/// Returns a record with the final mean `model_loss` and the per-epoch loss
/// curve `model_loss_epochs`.
pub fn train_dm<M: DynamicsModel>(
    traj: &Traj,
    dm: &mut M,
    epoch: usize,
    batch_size: usize,
    seed: u64,
) -> Result<Record> {
    validate_loop_args(epoch, batch_size)?;
    let flat = traj.flat_view()?;
    let next_obs = flat
        .next_obs
        .as_ref()
        .ok_or_else(|| StrandError::InvalidState("next_obs is missing; apply add_next_obs first".into()))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut epoch_losses = Vec::with_capacity(epoch);
    match dm.mode() {
        ModelMode::FeedForward => {
            for _ in 0..epoch {
                let mut losses = Vec::new();
                for ixs in shuffled_minibatches(flat.len(), batch_size, &mut rng)? {
                    let obs = flat.obs.select(ndarray::Axis(0), &ixs);
                    let acs = flat.acs.select(ndarray::Axis(0), &ixs);
                    let next = next_obs.select(ndarray::Axis(0), &ixs);
                    losses.push(dm.opt_step(&obs, &acs, &next)?);
                }
                epoch_losses.push(mean(&losses));
            }
        }
        ModelMode::Recurrent => {
            // Whole episodes in shuffled order; sequences are never cut.
            let mut order: Vec<usize> = (0..traj.num_epi()).collect();
            for _ in 0..epoch {
                order.shuffle(&mut rng);
                let mut losses = Vec::new();
                for &e in order.iter() {
                    let epi = &traj.epis()[e];
                    let next = epi.next_obs.as_ref().ok_or_else(|| {
                        StrandError::InvalidState(
                            "next_obs is missing; apply add_next_obs first".into(),
                        )
                    })?;
                    dm.reset();
                    losses.push(dm.opt_step(&epi.obs, &epi.acs, next)?);
                }
                epoch_losses.push(mean(&losses));
            }
        }
    }

    let final_loss = epoch_losses[epoch - 1];
    info!("Trained dynamics model for {} epochs, final loss {}", epoch, final_loss);

    let mut record = Record::empty();
    record.insert("model_loss", RecordValue::Scalar(final_loss));
    record.insert("model_loss_epochs", RecordValue::Array1(epoch_losses));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ModelParams;
    use crate::traj::{epi_functional, Episode};
    use ndarray::{Array1, Array2};
    use std::path::Path;

    struct MockDm {
        opt_steps: usize,
        mode: ModelMode,
        resets: usize,
    }

    impl ModelParams for MockDm {
        fn save_params(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    impl DynamicsModel for MockDm {
        fn mode(&self) -> ModelMode {
            self.mode
        }

        fn predict(&self, obs: &Array2<f32>, _acs: &Array2<f32>) -> Result<Array2<f32>> {
            Ok(obs.clone())
        }

        fn opt_step(
            &mut self,
            obs: &Array2<f32>,
            acs: &Array2<f32>,
            next_obs: &Array2<f32>,
        ) -> Result<f32> {
            assert_eq!(obs.nrows(), acs.nrows());
            assert_eq!(obs.nrows(), next_obs.nrows());
            self.opt_steps += 1;
            // Decreasing loss so the curve is distinguishable per epoch.
            Ok(1.0 / self.opt_steps as f32)
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    fn stitched_traj(lens: &[usize]) -> Traj {
        let mut traj = Traj::new(2, 1);
        let epis = lens
            .iter()
            .map(|&l| {
                let mut dones = Array1::zeros(l);
                dones[l - 1] = 1;
                Episode::new(
                    Array2::zeros((l, 2)),
                    Array2::zeros((l, 1)),
                    Array1::zeros(l),
                    dones,
                )
                .unwrap()
            })
            .collect();
        traj.add_epis(epis).unwrap();
        let mut traj = epi_functional::add_next_obs(traj).unwrap();
        traj.register().unwrap();
        traj
    }

    #[test]
    fn test_train_dm_feed_forward() {
        let traj = stitched_traj(&[5, 3]);
        let mut dm = MockDm {
            opt_steps: 0,
            mode: ModelMode::FeedForward,
            resets: 0,
        };
        let record = train_dm(&traj, &mut dm, 2, 4, 0).unwrap();
        // ceil(8 / 4) = 2 minibatches per epoch.
        assert_eq!(dm.opt_steps, 2 * 2);
        assert_eq!(record.get_array1("model_loss_epochs").unwrap().len(), 2);
        assert!(record.get_scalar("model_loss").unwrap() > 0.0);
    }

    #[test]
    fn test_train_dm_recurrent_resets_per_episode() {
        let traj = stitched_traj(&[5, 3, 2]);
        let mut dm = MockDm {
            opt_steps: 0,
            mode: ModelMode::Recurrent,
            resets: 0,
        };
        train_dm(&traj, &mut dm, 2, 4, 0).unwrap();
        assert_eq!(dm.opt_steps, 2 * 3);
        assert_eq!(dm.resets, 2 * 3);
    }

    #[test]
    fn test_train_dm_requires_next_obs() {
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
        let mut dm = MockDm {
            opt_steps: 0,
            mode: ModelMode::FeedForward,
            resets: 0,
        };
        assert!(train_dm(&traj, &mut dm, 1, 4, 0).is_err());
    }

    #[test]
    fn test_train_dm_requires_registered_view() {
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
        let mut dm = MockDm {
            opt_steps: 0,
            mode: ModelMode::FeedForward,
            resets: 0,
        };
        assert!(train_dm(&traj, &mut dm, 1, 4, 0).is_err());
    }
}
