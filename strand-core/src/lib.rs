#![warn(missing_docs)]
//! A library for trajectory-centric reinforcement learning.
//!
//! The core of the library is the trajectory data model and its
//! transformation pipeline: raw rollout episodes ([`traj::Episode`]) are
//! collected into a [`traj::Traj`], enriched by pure transforms
//! ([`traj::epi_functional`]) and advantage estimation ([`traj::gae`]), and
//! consumed by the training drivers in [`algo`]. The [`Trainer`] runs the
//! model-based aggregation loop: train the dynamics model, sample with a
//! planning policy, normalize the new episodes with the fixed original
//! statistics, merge and repeat.
//!
//! Networks, automatic differentiation and environments stay outside the
//! library, behind the traits re-exported from the crate root.
//!
//! ```
//! use ndarray::{Array1, Array2};
//! use strand_core::traj::{epi_functional as ef, Episode, Traj};
//!
//! // Two raw rollouts over a 2-dimensional observation space.
//! let epi = |l: usize| {
//!     let mut dones = Array1::zeros(l);
//!     dones[l - 1] = 1;
//!     Episode::new(
//!         Array2::from_shape_fn((l, 2), |(t, d)| (t + d) as f32),
//!         Array2::zeros((l, 1)),
//!         Array1::ones(l),
//!         dones,
//!     )
//! };
//!
//! let mut traj = Traj::new(2, 1);
//! traj.add_epis(vec![epi(5)?, epi(3)?])?;
//! let traj = ef::add_next_obs(traj)?;
//! let traj = ef::compute_horizon_masks(traj, 4)?;
//! let (mut traj, stats) = ef::normalize_obs_and_acs(traj, None)?;
//! traj.register()?;
//!
//! assert_eq!(traj.num_epi(), 2);
//! assert_eq!(traj.num_step(), 8);
//! assert_eq!(traj.flat_view()?.lookup(5), Some((1, 0)));
//! # Ok::<(), anyhow::Error>(())
//! ```
pub mod algo;
pub mod error;
pub mod record;
pub mod traj;

mod base;
pub use base::{
    DynamicsModel, EpiSampler, ModelMode, ModelParams, Policy, StateValue, StochasticPolicy,
    TrustRegionPolicy,
};

mod trainer;
pub use trainer::{Trainer, TrainerConfig};
