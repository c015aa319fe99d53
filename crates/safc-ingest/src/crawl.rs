//! Batch crawl over a numeric unit range.
//!
//! The range is split into contiguous, non-overlapping chunks, one per
//! worker. Each worker walks its chunk sequentially: cached pages are read
//! from disk, others are fetched and cached, then parsed and handed to the
//! [`Ingestor`]. A failing unit is logged and skipped; it never stops the
//! run. Workers share the store and the cache without further locking, since
//! every write is idempotent.

use std::{ops::Range, path::PathBuf, sync::Arc};

use safc_core::{review::SourceCategory, store::ReviewStore};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::{
  Result,
  cache::PageCache,
  failure_log::FailureLog,
  fetch::PageFetcher,
  ingestor::{CrawlOutcome, Ingestor, SubjectOutcome},
  parse::PageParser,
};

// ─── Partitioning ────────────────────────────────────────────────────────────

/// Split `range` into at most `workers` contiguous chunks covering it exactly.
/// Every chunk but the last has the same length.
pub fn partition(range: Range<u64>, workers: usize) -> Vec<Range<u64>> {
  let len = range.end.saturating_sub(range.start);
  if len == 0 {
    return Vec::new();
  }
  let workers = workers.max(1) as u64;
  let step = len.div_ceil(workers);

  let mut chunks = Vec::new();
  let mut start = range.start;
  while start < range.end {
    let end = start.saturating_add(step).min(range.end);
    chunks.push(start..end);
    start = end;
  }
  chunks
}

// ─── Settings & report ───────────────────────────────────────────────────────

/// `Full` fetches, parses and stores; `Prefetch` only fills the page cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
  #[default]
  Full,
  Prefetch,
}

#[derive(Debug, Clone)]
pub struct CrawlSettings {
  pub workers:           usize,
  pub source:            SourceCategory,
  pub cache_dir:         PathBuf,
  /// File name prefix for cached pages.
  pub cache_prefix:      String,
  pub fetch_failure_log: PathBuf,
  pub parse_failure_log: PathBuf,
}

/// Tallies for one crawl run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
  pub fetched:           u64,
  pub cached:            u64,
  pub fetch_failed:      u64,
  pub parse_failed:      u64,
  pub store_failed:      u64,
  pub subjects_created:  u64,
  pub subjects_existing: u64,
  pub subjects_skipped:  u64,
  pub reviews_created:   u64,
  pub reviews_existing:  u64,
}

impl CrawlReport {
  fn absorb(&mut self, outcome: &CrawlOutcome) {
    match outcome.subject {
      SubjectOutcome::Created => self.subjects_created += 1,
      SubjectOutcome::Existing => self.subjects_existing += 1,
      SubjectOutcome::Skipped => self.subjects_skipped += 1,
    }
    self.reviews_created += outcome.reviews_created as u64;
    self.reviews_existing += outcome.reviews_existing as u64;
  }

  fn merge(&mut self, other: CrawlReport) {
    self.fetched += other.fetched;
    self.cached += other.cached;
    self.fetch_failed += other.fetch_failed;
    self.parse_failed += other.parse_failed;
    self.store_failed += other.store_failed;
    self.subjects_created += other.subjects_created;
    self.subjects_existing += other.subjects_existing;
    self.subjects_skipped += other.subjects_skipped;
    self.reviews_created += other.reviews_created;
    self.reviews_existing += other.reviews_existing;
  }
}

// ─── Crawler ─────────────────────────────────────────────────────────────────

/// Worker-pool crawler. Cheap to clone.
pub struct Crawler<S, F, P> {
  inner: Arc<Inner<S, F, P>>,
}

impl<S, F, P> Clone for Crawler<S, F, P> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

struct Inner<S, F, P> {
  ingestor:       Ingestor<S>,
  fetcher:        F,
  parser:         P,
  cache:          PageCache,
  source:         SourceCategory,
  workers:        usize,
  fetch_failures: FailureLog,
  parse_failures: FailureLog,
}

impl<S, F, P> Crawler<S, F, P>
where
  S: ReviewStore + 'static,
  F: PageFetcher,
  P: PageParser,
{
  pub fn new(ingestor: Ingestor<S>, fetcher: F, parser: P, settings: CrawlSettings) -> Self {
    let CrawlSettings {
      workers,
      source,
      cache_dir,
      cache_prefix,
      fetch_failure_log,
      parse_failure_log,
    } = settings;

    Self {
      inner: Arc::new(Inner {
        ingestor,
        fetcher,
        parser,
        cache: PageCache::new(cache_dir, cache_prefix),
        source,
        workers: workers.max(1),
        fetch_failures: FailureLog::new(fetch_failure_log),
        parse_failures: FailureLog::new(parse_failure_log),
      }),
    }
  }

  pub fn ingestor(&self) -> &Ingestor<S> { &self.inner.ingestor }

  /// Crawl every unit in `range`. Only failing to prepare the cache
  /// directory is an error; per-unit failures are counted in the report.
  pub async fn run(&self, range: Range<u64>, mode: CrawlMode) -> Result<CrawlReport> {
    self.inner.cache.ensure_dir().await?;

    let chunks = partition(range.clone(), self.inner.workers);
    tracing::info!(
      start = range.start,
      end = range.end,
      workers = chunks.len(),
      ?mode,
      "crawl started"
    );

    let mut join_set = JoinSet::new();
    for chunk in chunks {
      let inner = Arc::clone(&self.inner);
      join_set.spawn(async move { inner.run_chunk(chunk, mode).await });
    }

    let mut report = CrawlReport::default();
    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok(chunk_report) => report.merge(chunk_report),
        Err(e) => tracing::error!(error = %e, "crawl worker aborted"),
      }
    }

    tracing::info!(?report, "crawl finished");
    Ok(report)
  }
}

impl<S, F, P> Inner<S, F, P>
where
  S: ReviewStore,
  F: PageFetcher,
  P: PageParser,
{
  async fn run_chunk(&self, chunk: Range<u64>, mode: CrawlMode) -> CrawlReport {
    let mut report = CrawlReport::default();
    for unit in chunk {
      self.run_unit(unit, mode, &mut report).await;
    }
    report
  }

  async fn run_unit(&self, unit: u64, mode: CrawlMode, report: &mut CrawlReport) {
    let Some(raw) = self.load_page(unit, report).await else {
      return;
    };
    if mode == CrawlMode::Prefetch {
      return;
    }

    let record = match self.parser.parse(unit, &raw) {
      Ok(record) => record,
      Err(e) => {
        tracing::warn!(unit, error = %e, "parse failed");
        self.parse_failures.record(unit, &e).await;
        report.parse_failed += 1;
        return;
      }
    };

    match self.ingestor.ingest_crawl(record, self.source).await {
      Ok(outcome) => report.absorb(&outcome),
      Err(e) => {
        tracing::error!(unit, error = %e, "store write failed; unit skipped");
        report.store_failed += 1;
      }
    }
  }

  /// The raw page for `unit`, from the cache when present. `None` when the
  /// unit could not be obtained; the failure is already logged.
  async fn load_page(&self, unit: u64, report: &mut CrawlReport) -> Option<String> {
    let cached = match self.cache.contains(unit).await {
      Ok(hit) => hit,
      Err(e) => {
        tracing::warn!(unit, error = %e, "cache check failed; fetching");
        false
      }
    };

    if cached {
      match self.cache.read(unit).await {
        Ok(raw) => {
          report.cached += 1;
          return Some(raw);
        }
        Err(e) => tracing::warn!(unit, error = %e, "cached page unreadable; fetching"),
      }
    }

    match self.fetcher.fetch(unit).await {
      Ok(raw) => {
        report.fetched += 1;
        if let Err(e) = self.cache.write(unit, &raw).await {
          tracing::warn!(unit, error = %e, "could not cache page");
        }
        Some(raw)
      }
      Err(e) => {
        tracing::warn!(unit, error = %e, "fetch failed");
        self.fetch_failures.record(unit, &e).await;
        report.fetch_failed += 1;
        None
      }
    }
  }
}
