//! The `ReviewStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `safc-store-sqlite`).
//! Ingestion, the dialog controller and the HTTP layer depend on this
//! abstraction and receive the store as an injected handle.

use std::{future::Future, path::Path};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ContentId, review::Review, subject::Subject};

/// What an id refers to, as far as the store knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
  Subject,
  Review,
}

/// Row counts reported by [`ReviewStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreStats {
  pub subjects:        u64,
  pub reviews:         u64,
  /// Subjects whose `created_date` is after the `since` cut-off.
  pub recent_subjects: u64,
  /// Reviews whose `date` is after the `since` cut-off.
  pub recent_reviews:  u64,
}

/// Abstraction over a review store backend.
///
/// Ids are content addresses, so every write is idempotent: a second insert
/// of the same review is a successful no-op, and a second upsert of the same
/// subject can at most replace its `info`.
///
/// All methods return `Send` futures so one store can be shared by dialog
/// sessions and crawl workers on a multi-threaded runtime.
pub trait ReviewStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert `subject`, or merge it into the existing row with the same id.
  ///
  /// The merge only touches `info`, and only when `subject.info` is `Some`;
  /// the path fields, category and creation date of an existing row never
  /// change. Returns the id and whether a new row was created.
  fn upsert_subject(
    &self,
    subject: Subject,
  ) -> impl Future<Output = Result<(ContentId, bool), Self::Error>> + Send + '_;

  /// Insert `review` unless a review with the same id exists. Returns the id
  /// and whether a new row was created.
  fn insert_review(
    &self,
    review: Review,
  ) -> impl Future<Output = Result<(ContentId, bool), Self::Error>> + Send + '_;

  // ── Point lookups ─────────────────────────────────────────────────────

  fn get_subject<'a>(
    &'a self,
    id: &'a ContentId,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  fn get_review<'a>(
    &'a self,
    id: &'a ContentId,
  ) -> impl Future<Output = Result<Option<Review>, Self::Error>> + Send + 'a;

  /// Whether `id` names a stored subject, a stored review, or neither.
  fn ref_kind<'a>(
    &'a self,
    id: &'a ContentId,
  ) -> impl Future<Output = Result<Option<RefKind>, Self::Error>> + Send + 'a;

  // ── Hierarchy ─────────────────────────────────────────────────────────

  /// Distinct subject categories.
  fn categories(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Distinct institutions under `category`.
  fn institutions<'a>(
    &'a self,
    category: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Distinct departments under `(category, institution)`.
  fn departments<'a>(
    &'a self,
    category: &'a str,
    institution: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Distinct subject names under `(institution, department)`.
  fn subject_names<'a>(
    &'a self,
    institution: &'a str,
    department: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// The category some existing subject at `institution` already carries.
  fn category_for_institution<'a>(
    &'a self,
    institution: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  // ── Reviews ───────────────────────────────────────────────────────────

  /// All reviews whose `subject_ref` is `subject_ref`, in insertion order.
  fn reviews_for<'a>(
    &'a self,
    subject_ref: &'a ContentId,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + 'a;

  // ── Search & statistics ───────────────────────────────────────────────

  /// Subjects whose name matches the SQL `LIKE` `pattern`.
  fn search_subjects<'a>(
    &'a self,
    pattern: &'a str,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + 'a;

  /// Reviews whose body matches the SQL `LIKE` `pattern`.
  fn search_reviews<'a>(
    &'a self,
    pattern: &'a str,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + 'a;

  /// Totals, plus rows dated after `since`.
  fn stats(&self, since: NaiveDate) -> impl Future<Output = Result<StoreStats, Self::Error>> + Send + '_;

  // ── Export ────────────────────────────────────────────────────────────

  /// Write a consistent, self-contained copy of the whole store to `dest`
  /// in the backend's native format. `dest` must not exist yet.
  fn export_to<'a>(&'a self, dest: &'a Path) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Authorship ────────────────────────────────────────────────────────

  /// Whether `otp` proves authorship of review `id`. `None` when no such
  /// review is stored; `Some(false)` for unsigned reviews.
  fn verify_authorship<'a>(
    &'a self,
    id: &'a ContentId,
    otp: &'a str,
  ) -> impl Future<Output = Result<Option<bool>, Self::Error>> + Send + 'a {
    async move { Ok(self.get_review(id).await?.map(|review| review.is_authored_by(otp))) }
  }
}
