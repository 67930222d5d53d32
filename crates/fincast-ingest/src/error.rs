//! Error types for the fincast-ingest codec.

use thiserror::Error;

/// A row that cannot become a [`fincast_core::Record`]. `row` is the
/// 1-based position of the row in its input.
#[derive(Debug, Error)]
pub enum Error {
  #[error("row {row}: expected a JSON object")]
  NotAnObject { row: usize },

  #[error("row {row}: missing required columns: {}", columns.join(", "))]
  MissingColumns { row: usize, columns: Vec<&'static str> },

  #[error("row {row}: unknown record_type {value:?}")]
  UnknownRecordType { row: usize, value: String },

  #[error("row {row}: invalid {column}: {value} ({expected})")]
  InvalidValue {
    row:      usize,
    column:   &'static str,
    value:    String,
    expected: &'static str,
  },

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  /// A record that failed to convert to or from its JSON payload.
  #[error(transparent)]
  Record(fincast_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<fincast_core::Error> for Error {
  fn from(e: fincast_core::Error) -> Self {
    match e {
      fincast_core::Error::Serialization(j) => Self::Json(j),
      other => Self::Record(other),
    }
  }
}

impl From<Error> for fincast_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Json(j) => Self::Serialization(j),
      Error::Record(core) => core,
      other => Self::InvalidInput(other.to_string()),
    }
  }
}
