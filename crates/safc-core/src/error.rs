//! Error types for `safc-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid content id: {0:?}")]
  InvalidId(String),

  #[error("unknown source category: {0:?}")]
  UnknownSourceCategory(String),

  #[error("unknown review type: {0:?}")]
  UnknownReviewType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
