//! Append-only record of units a crawl could not handle.
//!
//! Each line is `{unit}\t{reason}`. Fetch and parse failures go to separate
//! logs so each can be retried on its own.

use std::{fmt, path::PathBuf};

use tokio::{io::AsyncWriteExt as _, sync::Mutex};

use crate::{Error, Result};

#[derive(Debug)]
pub struct FailureLog {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FailureLog {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into(), lock: Mutex::new(()) } }

  pub fn path(&self) -> &std::path::Path { &self.path }

  /// Append one line for `unit`. A failure to write is logged and otherwise
  /// ignored: losing a log line must not stop the crawl.
  pub async fn record(&self, unit: u64, reason: &impl fmt::Display) {
    if let Err(e) = self.append(unit, reason).await {
      tracing::warn!(unit, error = %e, "could not write failure log");
    }
  }

  async fn append(&self, unit: u64, reason: &impl fmt::Display) -> Result<()> {
    let reason = reason.to_string().replace(['\n', '\r', '\t'], " ");
    let line = format!("{unit}\t{reason}\n");

    let _guard = self.lock.lock().await;
    let mut file = tokio::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .await
      .map_err(|e| Error::io(&self.path, e))?;
    file
      .write_all(line.as_bytes())
      .await
      .map_err(|e| Error::io(&self.path, e))
  }

  /// Units listed in the log, in the order they were recorded.
  pub async fn units(&self) -> Result<Vec<u64>> {
    let text = match tokio::fs::read_to_string(&self.path).await {
      Ok(text) => text,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(Error::io(&self.path, e)),
    };
    Ok(
      text
        .lines()
        .filter_map(|line| line.split('\t').next()?.parse().ok())
        .collect(),
    )
  }
}
