//! Episode sampler interface.
use super::Policy;
use crate::traj::Episode;
use anyhow::Result;

/// Collects complete episodes by running a policy against an environment.
///
/// The sampler may use parallel workers internally; the core treats it as a
/// blocking call that returns a complete batch of raw episode records,
/// un-normalized and un-masked. No partial results are consumed.
pub trait EpiSampler {
    /// Runs the policy and returns at most `max_episodes` complete episodes.
    fn sample(&mut self, policy: &mut dyn Policy, max_episodes: usize) -> Result<Vec<Episode>>;
}
