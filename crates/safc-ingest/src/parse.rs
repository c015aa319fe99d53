//! Turning a raw page into a [`CrawlRecord`].

use crate::{Error, Result, record::CrawlRecord};

/// Extracts the subject and its reviews from one raw page.
pub trait PageParser: Send + Sync + 'static {
  fn parse(&self, unit: u64, raw: &str) -> Result<CrawlRecord>;
}

/// Parser for pages already rendered as a JSON [`CrawlRecord`], as produced
/// by an upstream extraction step.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPageParser;

impl PageParser for JsonPageParser {
  fn parse(&self, unit: u64, raw: &str) -> Result<CrawlRecord> {
    let record: CrawlRecord = serde_json::from_str(raw)
      .map_err(|e| Error::Parse { unit, reason: e.to_string() })?;

    if record.name.trim().is_empty() {
      return Err(Error::Parse { unit, reason: "subject name is empty".into() });
    }
    if record.institution.trim().is_empty() {
      return Err(Error::Parse { unit, reason: "institution is empty".into() });
    }
    Ok(record)
  }
}
