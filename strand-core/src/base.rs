//! Interfaces of external collaborators.
//!
//! The core requests action samples from a policy, value and next-state
//! estimates from fitted functions, and raw per-episode rollouts from a
//! sampler. The actual networks, the automatic differentiation and the
//! optimizer numerics live behind these traits.
mod model;
mod params;
mod policy;
mod sampler;
mod vfunc;

pub use model::DynamicsModel;
pub use params::{ModelMode, ModelParams};
pub use policy::{Policy, StochasticPolicy, TrustRegionPolicy};
pub use sampler::EpiSampler;
pub use vfunc::StateValue;
