//! [`Ingestor`] — turns source records into store writes, applying the
//! policy of the path they came from.

use std::sync::Arc;

use safc_core::{
  ContentId,
  review::{Review, ReviewType, SourceCategory},
  store::ReviewStore,
  subject::{Subject, SubjectPath, UNCATEGORIZED},
  today,
};
use serde::{Deserialize, Serialize};

use crate::{
  record::{CrawlRecord, CrawlReview, ImportRecord},
  rules::CategoryRules,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What happened to the subject of an ingested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectOutcome {
  Created,
  /// Already stored; at most its `info` was replaced.
  Existing,
  /// No category could be inferred and the record had no reviews.
  Skipped,
}

/// Result of ingesting one crawl record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlOutcome {
  pub subject_id:       ContentId,
  pub subject:          SubjectOutcome,
  pub reviews_created:  usize,
  pub reviews_existing: usize,
}

/// Result of a web submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSubmission {
  pub subject_id:      ContentId,
  pub subject_created: bool,
  pub review:          Review,
  pub review_created:  bool,
}

/// Settings for the historical bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
  pub source:       SourceCategory,
  /// `created_date` given to imported subjects: the date of the last review
  /// in the dump, not the day the import ran.
  pub subject_date: String,
}

impl Default for ImportOptions {
  fn default() -> Self {
    Self { source: SourceCategory::Urfire, subject_date: "2022-05".to_owned() }
  }
}

// ─── Ingestor ────────────────────────────────────────────────────────────────

/// Routes records from every source through id derivation into the store.
pub struct Ingestor<S> {
  store: Arc<S>,
  rules: CategoryRules,
}

impl<S: ReviewStore> Ingestor<S> {
  pub fn new(store: Arc<S>, rules: CategoryRules) -> Self { Self { store, rules } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Interactive path ──────────────────────────────────────────────────────

  /// Create the subject a user resolved in a dialog. The path is
  /// authoritative: no category inference, no skip policy.
  pub async fn create_subject(&self, path: &SubjectPath) -> Result<(ContentId, bool), S::Error> {
    let (id, created) = self.store.upsert_subject(path.to_subject(today())).await?;
    if created {
      tracing::info!(subject = %id, institution = %path.institution, "subject created from dialog");
    }
    Ok((id, created))
  }

  /// Publish a review written in a dialog, committed to `otp`.
  pub async fn publish_review(
    &self,
    subject_ref: ContentId,
    body: String,
    date: String,
    otp: &str,
  ) -> Result<(Review, bool), S::Error> {
    self.publish(subject_ref, body, date, SourceCategory::Chat, Some(otp)).await
  }

  // ── Web path ──────────────────────────────────────────────────────────────

  /// Store a review submitted through the web form, creating its subject on
  /// demand. The review is signed only when a non-empty `otp` is given.
  pub async fn submit_web_review(
    &self,
    path: &SubjectPath,
    body: String,
    otp: Option<&str>,
  ) -> Result<WebSubmission, S::Error> {
    let (subject_id, subject_created) = self.create_subject(path).await?;
    let otp = otp.filter(|otp| !otp.is_empty());
    let (review, review_created) = self
      .publish(subject_id.clone(), body, today(), SourceCategory::Web, otp)
      .await?;
    Ok(WebSubmission { subject_id, subject_created, review, review_created })
  }

  async fn publish(
    &self,
    subject_ref: ContentId,
    body: String,
    date: String,
    source: SourceCategory,
    otp: Option<&str>,
  ) -> Result<(Review, bool), S::Error> {
    let review = Review::new(subject_ref, body, date, source, ReviewType::Teacher);
    let review = match otp {
      Some(otp) => review.signed_with(otp),
      None => review,
    };
    let (_, created) = self.store.insert_review(review.clone()).await?;
    if created {
      tracing::info!(review = %review.id, subject = %review.subject_ref, %source, "review published");
    }
    Ok((review, created))
  }

  // ── Crawl path ────────────────────────────────────────────────────────────

  /// Category for a subject at `institution` that is not stored yet: the rule
  /// table first, then whatever prior rows for the institution carry.
  pub async fn infer_category(&self, institution: &str) -> Result<String, S::Error> {
    if let Some(category) = self.rules.classify(institution) {
      return Ok(category.to_owned());
    }
    Ok(
      self
        .store
        .category_for_institution(institution)
        .await?
        .unwrap_or_else(|| UNCATEGORIZED.to_owned()),
    )
  }

  /// Ingest one crawled unit.
  ///
  /// A stored subject gets its `info` replaced. An unknown subject is only
  /// created when a category can be inferred or the record carries at least
  /// one review; otherwise the record is skipped. Reviews are then inserted
  /// depth-first, each reply referencing its parent review's id.
  pub async fn ingest_crawl(
    &self,
    record: CrawlRecord,
    source: SourceCategory,
  ) -> Result<CrawlOutcome, S::Error> {
    let CrawlRecord { institution, department, name, info, reviews } = record;
    let subject_id = safc_core::id::derive_subject_id(&institution, &department, &name);

    // A stored row keeps its category; the upsert below only touches `info`.
    let category = if self.store.get_subject(&subject_id).await?.is_some() {
      UNCATEGORIZED.to_owned()
    } else {
      let category = self.infer_category(&institution).await?;
      if category == UNCATEGORIZED && reviews.is_empty() {
        tracing::debug!(subject = %subject_id, %institution, %name, "no category and no reviews; skipped");
        return Ok(CrawlOutcome {
          subject_id,
          subject: SubjectOutcome::Skipped,
          reviews_created: 0,
          reviews_existing: 0,
        });
      }
      category
    };

    let mut incoming = Subject::new(category, institution, department, name, today());
    incoming.info = info;
    let (_, created) = self.store.upsert_subject(incoming).await?;
    let subject = if created { SubjectOutcome::Created } else { SubjectOutcome::Existing };

    let (reviews_created, reviews_existing) =
      self.insert_thread(&subject_id, &reviews, source).await?;

    Ok(CrawlOutcome { subject_id, subject, reviews_created, reviews_existing })
  }

  /// Insert `reviews` and all their replies. Returns (created, existing).
  async fn insert_thread(
    &self,
    subject_id: &ContentId,
    reviews: &[CrawlReview],
    source: SourceCategory,
  ) -> Result<(usize, usize), S::Error> {
    let mut created = 0;
    let mut existing = 0;

    // Reversed pushes keep siblings in page order.
    let mut stack: Vec<(ContentId, ReviewType, &CrawlReview)> = reviews
      .iter()
      .rev()
      .map(|r| (subject_id.clone(), ReviewType::Teacher, r))
      .collect();

    while let Some((parent, review_type, item)) = stack.pop() {
      let review = Review::new(parent, item.body.clone(), item.date.clone(), source, review_type);
      let (id, is_new) = self.store.insert_review(review).await?;
      if is_new {
        created += 1;
      } else {
        existing += 1;
      }
      stack.extend(item.replies.iter().rev().map(|reply| (id.clone(), ReviewType::Nest, reply)));
    }

    Ok((created, existing))
  }

  // ── Historical import path ────────────────────────────────────────────────

  /// Ingest one row of the historical dump. The dump's own category is
  /// trusted; the subject gets no `info`, so an existing row is left alone.
  /// Returns whether the subject and the review were newly created.
  pub async fn ingest_import(
    &self,
    record: ImportRecord,
    options: &ImportOptions,
  ) -> Result<(bool, bool), S::Error> {
    let subject = Subject::new(
      record.school_cate,
      record.university,
      record.department,
      record.supervisor,
      options.subject_date.clone(),
    );
    let (subject_id, subject_created) = self.store.upsert_subject(subject).await?;

    let review = Review::new(
      subject_id,
      record.description,
      record.date,
      options.source,
      ReviewType::Teacher,
    );
    let (_, review_created) = self.store.insert_review(review).await?;

    Ok((subject_created, review_created))
  }
}
