//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use safc_core::{
  ContentId,
  id::derive_subject_id,
  review::{Review, ReviewType, SourceCategory},
  store::{RefKind, ReviewStore},
  subject::Subject,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn dr_x() -> Subject { Subject::new("985", "Test University", "CS", "Dr. X", "2024-01-01") }

fn review_of(subject_ref: &ContentId, body: &str, date: &str, source: SourceCategory) -> Review {
  Review::new(subject_ref.clone(), body, date, source, ReviewType::Teacher)
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_subject() {
  let s = store().await;

  let (id, created) = s.upsert_subject(dr_x()).await.unwrap();
  assert!(created);
  assert_eq!(id, derive_subject_id("Test University", "CS", "Dr. X"));

  let fetched = s.get_subject(&id).await.unwrap().unwrap();
  assert_eq!(fetched, dr_x());
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  let id = derive_subject_id("Nowhere", "Nothing", "Nobody");
  assert!(s.get_subject(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn second_upsert_without_info_is_a_no_op() {
  let s = store().await;
  s.upsert_subject(dr_x().with_info("homepage")).await.unwrap();

  let (_, created) = s.upsert_subject(dr_x()).await.unwrap();
  assert!(!created);

  let fetched = s.get_subject(&dr_x().id).await.unwrap().unwrap();
  assert_eq!(fetched.info.as_deref(), Some("homepage"));
}

#[tokio::test]
async fn merge_only_replaces_info() {
  let s = store().await;
  s.upsert_subject(dr_x().with_info("old")).await.unwrap();

  // Same path, different category and date: only info may land.
  let incoming = Subject::new("211", "Test University", "CS", "Dr. X", "2030-12-31").with_info("new");
  let (id, created) = s.upsert_subject(incoming).await.unwrap();
  assert!(!created);

  let fetched = s.get_subject(&id).await.unwrap().unwrap();
  assert_eq!(fetched.info.as_deref(), Some("new"));
  assert_eq!(fetched.category, "985");
  assert_eq!(fetched.institution, "Test University");
  assert_eq!(fetched.department, "CS");
  assert_eq!(fetched.name, "Dr. X");
  assert_eq!(fetched.created_date, "2024-01-01");
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_review_is_stored_once() {
  let s = store().await;
  let (subject, _) = s.upsert_subject(dr_x()).await.unwrap();

  let chat = review_of(&subject, "Great mentor", "2024-01-01", SourceCategory::Chat).signed_with("abc");
  let crawl = review_of(&subject, "Great mentor", "2024-01-01", SourceCategory::PiReview);

  let (first_id, first_created) = s.insert_review(chat.clone()).await.unwrap();
  let (again_id, again_created) = s.insert_review(chat.clone()).await.unwrap();
  let (crawl_id, crawl_created) = s.insert_review(crawl).await.unwrap();

  assert!(first_created);
  assert!(!again_created);
  assert!(!crawl_created);
  assert_eq!(first_id, again_id);
  assert_eq!(first_id, crawl_id);

  let reviews = s.reviews_for(&subject).await.unwrap();
  assert_eq!(reviews.len(), 1);
  // The first writer wins: provenance and signature are not overwritten.
  assert_eq!(reviews[0], chat);
}

#[tokio::test]
async fn reviews_come_back_in_insertion_order() {
  let s = store().await;
  let (subject, _) = s.upsert_subject(dr_x()).await.unwrap();

  for body in ["zeta", "alpha", "mid"] {
    s.insert_review(review_of(&subject, body, "2024-01-01", SourceCategory::Urfire))
      .await
      .unwrap();
  }

  let bodies: Vec<_> = s
    .reviews_for(&subject)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.body)
    .collect();
  assert_eq!(bodies, ["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn nested_reviews_hang_off_their_parent() {
  let s = store().await;
  let (subject, _) = s.upsert_subject(dr_x()).await.unwrap();
  let (parent, _) = s
    .insert_review(review_of(&subject, "Great mentor", "2024-01-01", SourceCategory::PiReview))
    .await
    .unwrap();
  let reply = Review::new(parent.clone(), "Agreed", "2024-02-01", SourceCategory::PiReview, ReviewType::Nest);
  s.insert_review(reply.clone()).await.unwrap();

  assert_eq!(s.reviews_for(&subject).await.unwrap().len(), 1);
  assert_eq!(s.reviews_for(&parent).await.unwrap(), vec![reply]);
  assert_eq!(s.ref_kind(&subject).await.unwrap(), Some(RefKind::Subject));
  assert_eq!(s.ref_kind(&parent).await.unwrap(), Some(RefKind::Review));
  assert_eq!(
    s.ref_kind(&derive_subject_id("a", "b", "c")).await.unwrap(),
    None
  );
}

#[tokio::test]
async fn get_review_roundtrip() {
  let s = store().await;
  let (subject, _) = s.upsert_subject(dr_x()).await.unwrap();
  let review = review_of(&subject, "Great mentor", "2024-01-01", SourceCategory::Chat).signed_with("abc");
  let (id, _) = s.insert_review(review.clone()).await.unwrap();

  let fetched = s.get_review(&id).await.unwrap().unwrap();
  assert_eq!(fetched, review);
  assert!(fetched.is_authored_by("abc"));
}

#[tokio::test]
async fn verify_authorship_checks_stored_signature() {
  let s = store().await;
  let (subject, _) = s.upsert_subject(dr_x()).await.unwrap();
  let (signed, _) = s
    .insert_review(review_of(&subject, "Great mentor", "2024-01-01", SourceCategory::Chat).signed_with("abc"))
    .await
    .unwrap();
  let (unsigned, _) = s
    .insert_review(review_of(&subject, "Tough grader", "2024-01-02", SourceCategory::Urfire))
    .await
    .unwrap();

  assert_eq!(s.verify_authorship(&signed, "abc").await.unwrap(), Some(true));
  assert_eq!(s.verify_authorship(&signed, "abd").await.unwrap(), Some(false));
  assert_eq!(s.verify_authorship(&unsigned, "abc").await.unwrap(), Some(false));
  assert_eq!(s.verify_authorship(&subject, "abc").await.unwrap(), None);
}

// ─── Hierarchy ───────────────────────────────────────────────────────────────

async fn seeded() -> SqliteStore {
  let s = store().await;
  for (cat, uni, dept, name) in [
    ("985", "Tsinghua", "CS", "Prof. A"),
    ("985", "Tsinghua", "CS", "Prof. B"),
    ("985", "Tsinghua", "EE", "Prof. C"),
    ("985", "Fudan", "Math", "Prof. D"),
    ("211", "Harbin", "CS", "Prof. E"),
  ] {
    s.upsert_subject(Subject::new(cat, uni, dept, name, "2024-01-01"))
      .await
      .unwrap();
  }
  s
}

#[tokio::test]
async fn distinct_hierarchy_levels() {
  let s = seeded().await;

  assert_eq!(s.categories().await.unwrap(), ["211", "985"]);
  assert_eq!(s.institutions("985").await.unwrap(), ["Fudan", "Tsinghua"]);
  assert_eq!(s.departments("985", "Tsinghua").await.unwrap(), ["CS", "EE"]);
  assert_eq!(s.subject_names("Tsinghua", "CS").await.unwrap(), ["Prof. A", "Prof. B"]);
}

#[tokio::test]
async fn unknown_hierarchy_values_yield_empty_lists() {
  let s = seeded().await;

  assert!(s.institutions("nope").await.unwrap().is_empty());
  assert!(s.departments("985", "Harbin").await.unwrap().is_empty());
  assert!(s.subject_names("Tsinghua", "Law").await.unwrap().is_empty());
}

#[tokio::test]
async fn category_for_institution_uses_prior_rows() {
  let s = seeded().await;
  assert_eq!(s.category_for_institution("Harbin").await.unwrap().as_deref(), Some("211"));
  assert_eq!(s.category_for_institution("Unknown U").await.unwrap(), None);
}

// ─── Search & statistics ─────────────────────────────────────────────────────

#[tokio::test]
async fn like_search_over_names_and_bodies() {
  let s = seeded().await;
  let subject = derive_subject_id("Tsinghua", "CS", "Prof. A");
  s.insert_review(review_of(&subject, "kind and patient", "2024-01-01", SourceCategory::Urfire))
    .await
    .unwrap();
  s.insert_review(review_of(&subject, "never replies", "2024-01-02", SourceCategory::Urfire))
    .await
    .unwrap();

  let names: Vec<_> = s
    .search_subjects("Prof. _")
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names.len(), 5);

  let hits = s.search_reviews("%patient%").await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].body, "kind and patient");
}

#[tokio::test]
async fn stats_count_totals_and_recent_rows() {
  let s = store().await;
  s.upsert_subject(Subject::new("985", "U", "D", "Old", "2022-05")).await.unwrap();
  let (recent, _) = s
    .upsert_subject(Subject::new("985", "U", "D", "New", "2024-06-01"))
    .await
    .unwrap();
  s.insert_review(review_of(&recent, "old review", "2020-01-01", SourceCategory::Urfire))
    .await
    .unwrap();
  s.insert_review(review_of(&recent, "new review", "2024-06-02", SourceCategory::Chat))
    .await
    .unwrap();

  let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
  let stats = s.stats(since).await.unwrap();
  assert_eq!(stats.subjects, 2);
  assert_eq!(stats.reviews, 2);
  assert_eq!(stats.recent_subjects, 1);
  assert_eq!(stats.recent_reviews, 1);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("db.sqlite");

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.upsert_subject(dr_x()).await.unwrap().0
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert!(s.get_subject(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn export_writes_a_readable_copy() {
  let dir = tempfile::tempdir().unwrap();
  let dest = dir.path().join("export.db");

  let s = store().await;
  let (id, _) = s.upsert_subject(dr_x()).await.unwrap();
  s.insert_review(review_of(&id, "Kind", "2024-02-01", SourceCategory::Web)).await.unwrap();
  s.export_to(&dest).await.unwrap();

  let copy = SqliteStore::open(&dest).await.unwrap();
  assert!(copy.get_subject(&id).await.unwrap().is_some());
  assert_eq!(copy.reviews_for(&id).await.unwrap()[0].source, SourceCategory::Web);

  // The target must be fresh.
  assert!(s.export_to(&dest).await.is_err());
}
