//! Error types for `fincast-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing required input. The message names the offending
  /// field, column or value and what was expected.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("unknown record type discriminant: {0:?}")]
  UnknownRecordType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
