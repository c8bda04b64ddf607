//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of aggregation iterations.
    pub num_agg_iters: usize,

    /// The number of episodes collected with the exploration policy before
    /// the first iteration.
    pub num_random_rollouts: usize,

    /// The maximal number of episodes collected per iteration.
    pub max_episodes_per_iter: usize,

    /// Training epochs per iteration.
    pub epoch_per_iter: usize,

    /// Minibatch size.
    pub batch_size: usize,

    /// Lookahead window length for the horizon masks.
    pub horizon: usize,

    /// Random seed for minibatch shuffling.
    pub seed: u64,

    /// Where to save the trained model. `None` disables checkpointing.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_agg_iters: 1000,
            num_random_rollouts: 60,
            max_episodes_per_iter: 9,
            epoch_per_iter: 60,
            batch_size: 64,
            horizon: 4,
            seed: 0,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of aggregation iterations.
    pub fn num_agg_iters(mut self, v: usize) -> Self {
        self.num_agg_iters = v;
        self
    }

    /// Sets the number of initial exploration episodes.
    pub fn num_random_rollouts(mut self, v: usize) -> Self {
        self.num_random_rollouts = v;
        self
    }

    /// Sets the maximal number of episodes collected per iteration.
    pub fn max_episodes_per_iter(mut self, v: usize) -> Self {
        self.max_episodes_per_iter = v;
        self
    }

    /// Sets the number of training epochs per iteration.
    pub fn epoch_per_iter(mut self, v: usize) -> Self {
        self.epoch_per_iter = v;
        self
    }

    /// Sets the minibatch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the lookahead window length.
    pub fn horizon(mut self, v: usize) -> Self {
        self.horizon = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the directory where checkpoints are saved.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = Some(v.into());
        self
    }

    /// Constructs [`TrainerConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
