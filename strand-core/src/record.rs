//! Records of diagnostics produced during training.
//!
//! A [`Record`] is a flexible container of key-value pairs ([`RecordValue`]),
//! used by the algorithm drivers and the aggregation loop to report scalar
//! diagnostics (losses, KL estimates, reward statistics) without committing
//! to a particular output backend. A [`Recorder`] consumes records; the
//! `strand-csv-recorder` crate provides a tabular CSV backend, while
//! [`BufferedRecorder`] and [`NullRecorder`] serve tests and debugging.
//!
//! ```
//! use strand_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("model_loss", 0.5);
//! record.insert("n_epi", RecordValue::Scalar(3.0));
//! assert_eq!(record.get_scalar("n_epi").unwrap(), 3.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
