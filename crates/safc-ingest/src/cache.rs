//! On-disk cache of raw crawled pages, one file per unit.
//!
//! A cache hit means the unit is never fetched again, which is what lets an
//! interrupted crawl resume where it stopped. Files are written to a
//! temporary name and renamed into place, so a crash mid-write never leaves a
//! truncated page that later reads as a hit.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct PageCache {
  dir:    PathBuf,
  prefix: String,
}

impl PageCache {
  /// Cache rooted at `dir`, naming files `{prefix}{unit}.html`.
  pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
    Self { dir: dir.into(), prefix: prefix.into() }
  }

  pub fn dir(&self) -> &Path { &self.dir }

  pub fn path(&self, unit: u64) -> PathBuf { self.dir.join(format!("{}{unit}.html", self.prefix)) }

  /// Staging name for a write in progress. Carries the process id so two
  /// crawls writing the same unit never share a staging file.
  fn staging_path(&self, unit: u64) -> PathBuf {
    self
      .dir
      .join(format!("{}{unit}.html.{}.tmp", self.prefix, std::process::id()))
  }

  /// Create the cache directory if it does not exist yet.
  pub async fn ensure_dir(&self) -> Result<()> {
    tokio::fs::create_dir_all(&self.dir)
      .await
      .map_err(|e| Error::io(&self.dir, e))
  }

  pub async fn contains(&self, unit: u64) -> Result<bool> {
    let path = self.path(unit);
    tokio::fs::try_exists(&path).await.map_err(|e| Error::io(path, e))
  }

  pub async fn read(&self, unit: u64) -> Result<String> {
    let path = self.path(unit);
    tokio::fs::read_to_string(&path).await.map_err(|e| Error::io(path, e))
  }

  pub async fn write(&self, unit: u64, page: &str) -> Result<()> {
    let path = self.path(unit);
    let tmp = self.staging_path(unit);

    tokio::fs::write(&tmp, page).await.map_err(|e| Error::io(&tmp, e))?;
    tokio::fs::rename(&tmp, &path).await.map_err(|e| Error::io(path, e))
  }
}
