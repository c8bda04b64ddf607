//! Parameter persistence and capability tags of function approximators.
use anyhow::Result;
use std::path::Path;

/// How a function approximator consumes trajectory data.
///
/// Feed-forward models are fed shuffled flat minibatches; recurrent models
/// are fed whole episodes in shuffled episode order, so that sequences are
/// never cut at minibatch boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelMode {
    /// Stateless model, consumes rows independently.
    FeedForward,

    /// Sequence model with hidden state, consumes whole episodes.
    Recurrent,
}

/// Serializable parameters of a trainable collaborator.
///
/// Implementors commonly create a number of files in the given directory,
/// one per parameterized component.
pub trait ModelParams {
    /// Save the parameters in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
