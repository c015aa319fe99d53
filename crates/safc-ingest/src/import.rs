//! Historical bulk import of a RateMySupervisor JSON dump.

use std::path::Path;

use safc_core::store::ReviewStore;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  ingestor::{ImportOptions, Ingestor},
  record::ImportRecord,
};

/// Tallies for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  pub records:          u64,
  pub subjects_created: u64,
  pub reviews_created:  u64,
  pub reviews_existing: u64,
  pub store_failed:     u64,
}

/// Import every row of the JSON array at `path`.
///
/// An unreadable or malformed file is an error. A row the store rejects is
/// logged and counted, and the import carries on.
pub async fn import_file<S: ReviewStore>(
  ingestor: &Ingestor<S>,
  path: impl AsRef<Path>,
  options: &ImportOptions,
) -> Result<ImportReport> {
  let path = path.as_ref();
  let text = tokio::fs::read_to_string(path)
    .await
    .map_err(|e| Error::io(path, e))?;
  let records: Vec<ImportRecord> = serde_json::from_str(&text)?;

  tracing::info!(path = %path.display(), records = records.len(), source = %options.source, "import started");
  let report = import_records(ingestor, records, options).await;
  tracing::info!(?report, "import finished");
  Ok(report)
}

/// Import already-decoded rows.
pub async fn import_records<S: ReviewStore>(
  ingestor: &Ingestor<S>,
  records: Vec<ImportRecord>,
  options: &ImportOptions,
) -> ImportReport {
  let mut report = ImportReport::default();

  for record in records {
    report.records += 1;
    let supervisor = record.supervisor.clone();
    match ingestor.ingest_import(record, options).await {
      Ok((subject_created, review_created)) => {
        report.subjects_created += u64::from(subject_created);
        if review_created {
          report.reviews_created += 1;
        } else {
          report.reviews_existing += 1;
        }
      }
      Err(e) => {
        tracing::warn!(%supervisor, error = %e, "import row skipped");
        report.store_failed += 1;
      }
    }
  }

  report
}
