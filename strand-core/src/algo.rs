//! Training algorithm drivers.
//!
//! The drivers own the epoch/minibatch loop and the diagnostics; all
//! gradient numerics stay behind the collaborator traits in
//! [`base`](crate::base). Given a seed, the minibatch partition is
//! deterministic.
pub mod dynamics;
pub mod trpo;

use crate::error::StrandError;
use anyhow::Result;
use itertools::Itertools;
use rand::{rngs::StdRng, seq::SliceRandom};

/// Partitions `0..num_samples` into shuffled minibatches.
///
/// The last minibatch may be smaller than `batch_size`. Deterministic for a
/// given RNG state.
pub fn shuffled_minibatches(
    num_samples: usize,
    batch_size: usize,
    rng: &mut StdRng,
) -> Result<Vec<Vec<usize>>> {
    if batch_size == 0 {
        return Err(StrandError::InvalidArgument("batch_size must be positive".into()).into());
    }
    if num_samples == 0 {
        return Err(StrandError::InvalidArgument("no samples to batch".into()).into());
    }
    let mut ixs: Vec<usize> = (0..num_samples).collect();
    ixs.shuffle(rng);
    Ok(ixs
        .into_iter()
        .chunks(batch_size)
        .into_iter()
        .map(|chunk| chunk.collect())
        .collect())
}

fn validate_loop_args(epoch: usize, batch_size: usize) -> Result<()> {
    if epoch == 0 {
        return Err(StrandError::InvalidArgument("epoch must be positive".into()).into());
    }
    if batch_size == 0 {
        return Err(StrandError::InvalidArgument("batch_size must be positive".into()).into());
    }
    Ok(())
}

fn mean(vs: &[f32]) -> f32 {
    vs.iter().sum::<f32>() / vs.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_minibatches_cover_all_indices() {
        let mut rng = StdRng::seed_from_u64(42);
        let batches = shuffled_minibatches(10, 3, &mut rng).unwrap();
        assert_eq!(batches.len(), 4);
        assert_eq!(batches[3].len(), 1);
        let mut all: Vec<usize> = batches.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_minibatches_deterministic_given_seed() {
        let mut rng1 = StdRng::seed_from_u64(7);
        let mut rng2 = StdRng::seed_from_u64(7);
        let b1 = shuffled_minibatches(32, 8, &mut rng1).unwrap();
        let b2 = shuffled_minibatches(32, 8, &mut rng2).unwrap();
        assert_eq!(b1, b2);
    }

    #[test]
    fn test_minibatches_rejects_zero_batch_size() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(shuffled_minibatches(10, 0, &mut rng).is_err());
    }
}
