//! Source records as they arrive from the crawler and the historical dump.

use serde::{Deserialize, Serialize};

/// One crawled unit: a subject and the reviews shown on its page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrawlRecord {
  pub institution: String,
  pub department:  String,
  pub name:        String,
  #[serde(default)]
  pub info:        Option<String>,
  #[serde(default)]
  pub reviews:     Vec<CrawlReview>,
}

/// A review on a crawled page, with the replies posted under it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrawlReview {
  pub body:    String,
  /// `YYYY-MM-DD`.
  pub date:    String,
  #[serde(default)]
  pub replies: Vec<CrawlReview>,
}

impl CrawlReview {
  pub fn new(body: impl Into<String>, date: impl Into<String>) -> Self {
    Self { body: body.into(), date: date.into(), replies: Vec::new() }
  }

  pub fn with_reply(mut self, reply: CrawlReview) -> Self {
    self.replies.push(reply);
    self
  }
}

/// One row of the historical RateMySupervisor JSON dump. Extra keys in the
/// dump (`rate`, `counts`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
  pub school_cate: String,
  pub university:  String,
  pub department:  String,
  pub supervisor:  String,
  pub description: String,
  pub date:        String,
}
