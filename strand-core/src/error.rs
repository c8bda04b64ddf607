//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// All errors are raised at the point of detection and propagate to the
/// caller; none of them is caught or retried inside the library. A malformed
/// trajectory or an out-of-range hyperparameter is a programming error, not
/// a transient fault.
#[derive(Error, Debug)]
pub enum StrandError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A field's dimensionality disagrees with the declared observation or
    /// action space.
    #[error("Shape mismatch in field '{field}': expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Name of the offending field.
        field: String,
        /// Expected dimensionality or length.
        expected: usize,
        /// Actual dimensionality or length.
        actual: usize,
    },

    /// Operation on an unregistered or otherwise inconsistent trajectory.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Hyperparameter outside its valid domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
