//! Trajectory data model and its transformation pipeline.
//!
//! An [`Episode`] holds one rollout's raw arrays; a [`Traj`] is an ordered
//! collection of episodes with a registered flat view for feed-forward
//! minibatch consumption. The functions in [`epi_functional`] derive new
//! fields (next observations, horizon masks, normalized inputs) and
//! [`gae`](crate::traj::gae) adds advantage and return targets.
mod base;
mod episode;
pub mod epi_functional;
pub mod gae;
mod stats;

pub use base::{FlatBatch, FlatView, Traj};
pub use episode::Episode;
pub use stats::NormalizeStats;
