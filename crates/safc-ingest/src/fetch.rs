//! Fetching raw pages for crawl units.

use std::{future::Future, time::Duration};

use reqwest::Client;

use crate::{Error, Result};

/// Placeholder in a URL template that is replaced by the unit number.
pub const UNIT_PLACEHOLDER: &str = "{id}";

/// Retrieves the raw page for one numeric crawl unit.
pub trait PageFetcher: Send + Sync + 'static {
  fn fetch(&self, unit: u64) -> impl Future<Output = Result<String>> + Send + '_;
}

/// Fetches pages over HTTP(S) from a URL template such as
/// `https://pi-review.com/pis/{id}`.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpFetcher {
  client:       Client,
  url_template: String,
}

impl HttpFetcher {
  pub fn new(url_template: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, url_template: url_template.into() })
  }

  pub fn url(&self, unit: u64) -> String {
    self.url_template.replace(UNIT_PLACEHOLDER, &unit.to_string())
  }
}

impl PageFetcher for HttpFetcher {
  async fn fetch(&self, unit: u64) -> Result<String> {
    let resp = self.client.get(self.url(unit)).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status { unit, status: status.as_u16() });
    }
    Ok(resp.text().await?)
  }
}
