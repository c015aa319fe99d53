//! Error type for `safc-ingest`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("unit {unit} answered with status {status}")]
  Status { unit: u64, status: u16 },

  #[error("unit {unit} could not be parsed: {reason}")]
  Parse { unit: u64, reason: String },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
