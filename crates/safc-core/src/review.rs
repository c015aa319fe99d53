//! Review — immutable free-text feedback attached to a subject or to another
//! review.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{ContentId, Error, Result, commitment, id::derive_review_id};

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Which channel a review entered the store through. Stored lowercase in the
/// `source_cate` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
  /// Added by hand by an operator.
  Admin,
  /// Historical RateMySupervisor bulk import.
  Urfire,
  /// The earlier Telegram front end.
  Telegram,
  /// The guided dialog served by this system.
  Chat,
  Web,
  /// Crawl of pi-review.com.
  PiReview,
}

impl SourceCategory {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownSourceCategory(s.to_owned()))
  }
}

/// What a review is about. `Nest` marks a review of another review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
  Nest,
  Teacher,
  Course,
  Student,
  Unity,
  Info,
}

impl ReviewType {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownReviewType(s.to_owned()))
  }
}

// ─── Review ──────────────────────────────────────────────────────────────────

/// A single review. No field changes after the review is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub id:               ContentId,
  /// A subject id, or a review id when `review_type` is [`ReviewType::Nest`].
  pub subject_ref:      ContentId,
  pub body:             String,
  /// `YYYY-MM-DD`.
  pub date:             String,
  pub source:           SourceCategory,
  pub review_type:      ReviewType,
  pub author_signature: Option<String>,
}

impl Review {
  /// Build an unsigned review, deriving its id.
  pub fn new(
    subject_ref: ContentId,
    body: impl Into<String>,
    date: impl Into<String>,
    source: SourceCategory,
    review_type: ReviewType,
  ) -> Self {
    let body = body.into();
    let date = date.into();
    Self {
      id: derive_review_id(&subject_ref, &body, &date),
      subject_ref,
      body,
      date,
      source,
      review_type,
      author_signature: None,
    }
  }

  /// Attach the authorship commitment for `otp`. The OTP is not kept.
  pub fn signed_with(mut self, otp: &str) -> Self {
    self.author_signature = Some(commitment::sign(&self.id, otp));
    self
  }

  /// Whether `otp` proves authorship of this review. Always `false` for
  /// unsigned reviews.
  pub fn is_authored_by(&self, otp: &str) -> bool {
    self
      .author_signature
      .as_deref()
      .is_some_and(|sig| commitment::verify(&self.id, otp, sig))
  }

  /// The body as shown to readers: stored `<br>` markers become newlines.
  pub fn display_body(&self) -> String { self.body.replace("<br>", "\n") }
}
