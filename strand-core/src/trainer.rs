//! Aggregation loop of model-based reinforcement learning.
mod config;

use crate::{
    algo,
    base::{DynamicsModel, EpiSampler, Policy},
    error::StrandError,
    record::{Record, RecordValue::Scalar, Recorder},
    traj::{epi_functional, Episode, NormalizeStats, Traj},
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::info;
use std::fs;
use std::path::Path;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the aggregation loop of model-based reinforcement learning.
///
/// # Aggregation loop
///
/// 0. Given a dynamics model implementing [`DynamicsModel`], an exploration
///    policy and a planning policy implementing [`Policy`], a sampler
///    implementing [`EpiSampler`] and a [`Recorder`].
/// 1. Collect `num_random_rollouts` episodes with the exploration policy,
///    stitch `next_obs`, compute horizon masks, normalize observations and
///    actions and keep the computed statistics fixed for the whole run.
///    The mean episode reward of this dataset is the baseline for the
///    "best" checkpoint.
/// 2. For each of `num_agg_iters` iterations:
///     1. Train the dynamics model on the accumulated trajectory.
///     2. Sample at most `max_episodes_per_iter` episodes with the planning
///        policy. The planning policy is expected to read the parameters of
///        the model being trained (e.g., through shared interior
///        mutability); refreshing it is the collaborator's business.
///     3. Apply the same transforms to the new episodes, normalizing with
///        the *original* statistics, then merge them into the running
///        trajectory and re-register.
///     4. Write one record with episode/step counts, reward statistics and
///        training diagnostics to the recorder.
///     5. If the iteration's mean episode reward is the best so far, save
///        the model parameters in `(model_dir)/best`; save
///        `(model_dir)/last` every iteration.
/// 3. Terminate after the fixed iteration count.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[EpiSampler]-->|"Vec&lt;Episode&gt;"|B[Traj]
///     B -->|transforms + register|C[FlatView]
///     C -->|minibatches|D[DynamicsModel]
///     D -.->|parameters|E[planning Policy]
///     E --> A
/// ```
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self { config }
    }

    fn save_model<M: DynamicsModel>(dm: &M, model_dir: String) {
        match dm.save_params(Path::new(&model_dir)) {
            Ok(()) => info!("Saved the model in {:?}.", &model_dir),
            Err(_) => info!("Failed to save model in {:?}.", &model_dir),
        }
    }

    fn save_best_model<M: DynamicsModel>(dm: &M, model_dir: String) {
        let model_dir = model_dir + "/best";
        Self::save_model(dm, model_dir);
    }

    fn save_last_model<M: DynamicsModel>(dm: &M, model_dir: String) {
        let model_dir = model_dir + "/last";
        Self::save_model(dm, model_dir);
    }

    fn mean_epi_rew(epis: &[Episode]) -> f32 {
        epis.iter().map(|e| e.ret()).sum::<f32>() / epis.len() as f32
    }

    /// Applies the transform pipeline to freshly sampled episodes.
    ///
    /// `stats` is `None` only for the initial dataset; every later batch is
    /// normalized with the statistics computed back then.
    fn preprocess(
        &self,
        epis: Vec<Episode>,
        obs_dim: usize,
        ac_dim: usize,
        stats: Option<&NormalizeStats>,
    ) -> Result<(Traj, NormalizeStats)> {
        let mut traj = Traj::new(obs_dim, ac_dim);
        traj.add_epis(epis)?;
        let traj = epi_functional::add_next_obs(traj)?;
        let traj = epi_functional::compute_horizon_masks(traj, self.config.horizon)?;
        epi_functional::normalize_obs_and_acs(traj, stats)
    }

    /// Runs the aggregation loop.
    ///
    /// Returns the normalization statistics computed from the initial
    /// dataset, for use by planning at deployment time.
    pub fn train<M: DynamicsModel>(
        &self,
        dm: &mut M,
        rand_pol: &mut dyn Policy,
        plan_pol: &mut dyn Policy,
        sampler: &mut dyn EpiSampler,
        recorder: &mut dyn Recorder,
    ) -> Result<NormalizeStats> {
        if let Some(model_dir) = &self.config.model_dir {
            fs::create_dir_all(model_dir)?;
            self.config.save(Path::new(model_dir).join("config.yaml"))?;
        }

        // Initial dataset, collected with the exploration policy.
        let epis = sampler.sample(rand_pol, self.config.num_random_rollouts)?;
        if epis.is_empty() {
            return Err(StrandError::InvalidState("sampler returned no episodes".into()).into());
        }
        let (obs_dim, ac_dim) = (epis[0].obs.ncols(), epis[0].acs.ncols());
        let mut max_rew = Self::mean_epi_rew(&epis);
        let (mut traj, stats) = self.preprocess(epis, obs_dim, ac_dim, None)?;
        traj.register()?;
        info!(
            "Collected initial dataset: {} episodes, {} steps",
            traj.num_epi(),
            traj.num_step()
        );

        let mut total_epi = traj.num_epi();
        let mut total_step = traj.num_step();

        for iter in 1..=self.config.num_agg_iters {
            let record_dm = algo::dynamics::train_dm(
                &traj,
                dm,
                self.config.epoch_per_iter,
                self.config.batch_size,
                self.config.seed.wrapping_add(iter as u64),
            )?;

            let epis = sampler.sample(plan_pol, self.config.max_episodes_per_iter)?;
            if epis.is_empty() {
                return Err(
                    StrandError::InvalidState("sampler returned no episodes".into()).into(),
                );
            }
            let rews: Vec<f32> = epis.iter().map(|e| e.ret()).collect();
            let n_epi = epis.len();
            let n_step: usize = epis.iter().map(|e| e.len()).sum();

            // New episodes are normalized with the original fixed statistics.
            let (curr, _) = self.preprocess(epis, obs_dim, ac_dim, Some(&stats))?;
            traj.merge(curr)?;
            traj.register()?;

            total_epi += n_epi;
            total_step += n_step;
            let mean_rew = rews.iter().sum::<f32>() / n_epi as f32;
            let min_rew = rews.iter().fold(f32::MAX, |m, &r| r.min(m));
            let max_rew_iter = rews.iter().fold(f32::MIN, |m, &r| r.max(m));

            let mut record = Record::empty();
            record.insert("iteration", Scalar(iter as f32));
            record.insert("n_epi", Scalar(n_epi as f32));
            record.insert("n_step", Scalar(n_step as f32));
            record.insert("total_epi", Scalar(total_epi as f32));
            record.insert("total_step", Scalar(total_step as f32));
            record.insert("mean_rew", Scalar(mean_rew));
            record.insert("min_rew", Scalar(min_rew));
            record.insert("max_rew", Scalar(max_rew_iter));
            recorder.write(record.merge(record_dm));

            if let Some(model_dir) = &self.config.model_dir {
                if mean_rew > max_rew {
                    max_rew = mean_rew;
                    Self::save_best_model(dm, model_dir.clone());
                }
                Self::save_last_model(dm, model_dir.clone());
            }
        }

        Ok(stats)
    }
}
