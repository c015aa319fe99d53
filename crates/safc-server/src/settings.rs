//! Process configuration: an optional TOML file layered under `SAFC_*`
//! environment variables.
//!
//! ```toml
//! store_path        = "~/.local/share/safc/safc.db"
//! transport_token   = "..."
//! session_ttl_secs  = 86400
//! max_posts_per_day = 20
//!
//! [crawl]
//! url_template = "https://pi-review.com/pis/{id}"
//! workers      = 4
//!
//! [[category_rules]]
//! pattern  = "大学"
//! category = "本科"
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `SAFC_CRAWL__WORKERS=8`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use safc_api::limit::MAX_POSTS_PER_DAY;
use safc_core::review::SourceCategory;
use safc_dialog::DEFAULT_SESSION_TTL;
use safc_ingest::{CategoryRules, CrawlSettings, ImportOptions};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path:        PathBuf,
  pub host:              String,
  pub port:              u16,
  /// Bearer token the chat front end presents. Empty disables the dialog
  /// routes.
  pub transport_token:   String,
  /// Dialog sessions idle this long are dropped.
  pub session_ttl_secs:  u64,
  /// Public `POST`s allowed per client per day.
  pub max_posts_per_day: u64,
  pub cache_dir:         PathBuf,
  pub crawl:             CrawlConfig,
  pub category_rules:    CategoryRules,
  pub import:            ImportOptions,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:        PathBuf::from("safc.db"),
      host:              "127.0.0.1".to_owned(),
      port:              8080,
      transport_token:   String::new(),
      session_ttl_secs:  DEFAULT_SESSION_TTL.as_secs(),
      max_posts_per_day: MAX_POSTS_PER_DAY,
      cache_dir:         PathBuf::from("tmp"),
      crawl:             CrawlConfig::default(),
      category_rules:    CategoryRules::default(),
      import:            ImportOptions::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
  /// `{id}` is replaced by the unit number.
  pub url_template:      String,
  pub workers:           usize,
  pub source:            SourceCategory,
  pub cache_prefix:      String,
  pub fetch_failure_log: PathBuf,
  pub parse_failure_log: PathBuf,
}

impl Default for CrawlConfig {
  fn default() -> Self {
    Self {
      url_template:      "https://pi-review.com/pis/{id}".to_owned(),
      workers:           4,
      source:            SourceCategory::PiReview,
      cache_prefix:      "pi-review_pis_".to_owned(),
      fetch_failure_log: PathBuf::from("tmp/crawl-fetch-failures.log"),
      parse_failure_log: PathBuf::from("tmp/crawl-parse-failures.log"),
    }
  }
}

impl Settings {
  /// Read `path` (if it exists) and the `SAFC_*` environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SAFC")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise settings")?;

    settings.store_path = expand_tilde(&settings.store_path);
    settings.cache_dir = expand_tilde(&settings.cache_dir);
    settings.crawl.fetch_failure_log = expand_tilde(&settings.crawl.fetch_failure_log);
    settings.crawl.parse_failure_log = expand_tilde(&settings.crawl.parse_failure_log);
    Ok(settings)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn session_ttl(&self) -> Duration { Duration::from_secs(self.session_ttl_secs) }

  /// Worker-pool settings for a crawl. `workers` overrides the configured
  /// pool size.
  pub fn crawl_settings(&self, workers: Option<usize>) -> CrawlSettings {
    CrawlSettings {
      workers:           workers.unwrap_or(self.crawl.workers),
      source:            self.crawl.source,
      cache_dir:         self.cache_dir.clone(),
      cache_prefix:      self.crawl.cache_prefix.clone(),
      fetch_failure_log: self.crawl.fetch_failure_log.clone(),
      parse_failure_log: self.crawl.parse_failure_log.clone(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
