//! Session walks against an in-memory store.

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::NaiveDate;
use safc_core::{
  ContentId,
  id::{derive_review_id, derive_subject_id},
  review::{Review, ReviewType, SourceCategory},
  store::{RefKind, ReviewStore, StoreStats},
  subject::{Subject, SubjectPath},
  today,
};
use safc_ingest::{CategoryRules, Ingestor};
use safc_store_sqlite::SqliteStore;

use crate::{Action, Controller, DEFAULT_SESSION_TTL, Input, Reply, State};

const SESSION: &str = "chat-1";

async fn seeded_store() -> SqliteStore {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  for (cat, uni, dept, name) in [
    ("985", "Tsinghua", "CS", "Prof. A"),
    ("985", "Tsinghua", "CS", "Prof. B"),
    ("985", "Tsinghua", "EE", "Prof. C"),
    ("211", "Harbin", "CS", "Prof. E"),
  ] {
    store
      .upsert_subject(Subject::new(cat, uni, dept, name, "2024-01-01"))
      .await
      .unwrap();
  }
  store
    .upsert_subject(Subject::new("985", "Tsinghua", "CS", "Prof. A", "2024-01-01").with_info("Homepage: https://a.example"))
    .await
    .unwrap();
  store
}

async fn controller() -> Controller<SqliteStore> {
  let ingestor = Ingestor::new(Arc::new(seeded_store().await), CategoryRules::default());
  Controller::new(Arc::new(ingestor))
}

fn text(s: &str) -> Input { Input::Text(s.to_owned()) }

/// Feed `inputs` in order, returning the last reply.
async fn walk<S: ReviewStore>(c: &Controller<S>, inputs: &[Input]) -> Reply {
  let mut last = Reply::default();
  for input in inputs {
    last = c.handle(SESSION, input.clone()).await;
  }
  last
}

fn to_subject(category: &str, institution: &str, department: &str, name: &str) -> Vec<Input> {
  vec![Input::Start, text(category), text(institution), text(department), text(name)]
}

// ─── Hierarchy walk ──────────────────────────────────────────────────────────

#[tokio::test]
async fn start_offers_known_categories() {
  let c = controller().await;
  let reply = c.handle(SESSION, Input::Start).await;

  assert_eq!(reply.suggestions, ["211", "985"]);
  assert_eq!(c.state(SESSION).await, Some(State::Category));
  assert_eq!(c.active_sessions().await, 1);
}

#[tokio::test]
async fn each_level_suggests_values_under_the_partial_path() {
  let c = controller().await;
  c.handle(SESSION, Input::Start).await;

  let reply = c.handle(SESSION, text("985")).await;
  assert_eq!(reply.suggestions, ["Tsinghua"]);

  let reply = c.handle(SESSION, text("Tsinghua")).await;
  assert_eq!(reply.suggestions, ["CS", "EE"]);

  let reply = c.handle(SESSION, text("CS")).await;
  assert_eq!(reply.suggestions, ["Prof. A", "Prof. B"]);
  assert_eq!(
    c.state(SESSION).await,
    Some(State::Subject {
      category:    "985".into(),
      institution: "Tsinghua".into(),
      department:  "CS".into(),
    })
  );
}

#[tokio::test]
async fn unseen_values_are_accepted_with_empty_suggestions() {
  let c = controller().await;
  c.handle(SESSION, Input::Start).await;

  let reply = c.handle(SESSION, text("U.S.")).await;
  assert!(reply.suggestions.is_empty());
  let reply = c.handle(SESSION, text("Test University")).await;
  assert!(reply.suggestions.is_empty());
  assert!(matches!(c.state(SESSION).await, Some(State::Department { .. })));
}

#[tokio::test]
async fn subject_existence_selects_the_menu() {
  let c = controller().await;

  let reply = walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. A")).await;
  assert_eq!(reply.actions, Action::EXISTING);
  assert!(matches!(c.state(SESSION).await, Some(State::Menu { exists: true, .. })));

  let reply = walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. Z")).await;
  assert_eq!(reply.actions, Action::UNKNOWN);
  let Some(State::Menu { subject_id, exists, .. }) = c.state(SESSION).await else {
    panic!("expected menu state");
  };
  assert!(!exists);
  assert_eq!(subject_id, derive_subject_id("Tsinghua", "CS", "Prof. Z"));
}

// ─── Menu actions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_subject_then_full_menu() {
  let c = controller().await;
  walk(&c, &to_subject("U.S.", "Test University", "CS", "Dr. X")).await;

  let reply = c.handle(SESSION, Input::Select(Action::CreateSubject)).await;
  assert_eq!(reply.actions, Action::EXISTING);

  let id = derive_subject_id("Test University", "CS", "Dr. X");
  let subject = c.ingestor().store().get_subject(&id).await.unwrap().unwrap();
  assert_eq!(subject.category, "U.S.");
  assert_eq!(subject.created_date, today());
  assert!(matches!(c.state(SESSION).await, Some(State::Menu { exists: true, .. })));
}

#[tokio::test]
async fn add_review_signs_and_returns_to_menu() {
  let c = controller().await;
  walk(&c, &to_subject("U.S.", "Test University", "CS", "Dr. X")).await;
  c.handle(SESSION, Input::Select(Action::CreateSubject)).await;

  c.handle(SESSION, Input::Select(Action::AddReview)).await;
  assert!(matches!(c.state(SESSION).await, Some(State::Compose { .. })));

  let subject_id = derive_subject_id("Test University", "CS", "Dr. X");
  let date = today();
  let review_id = derive_review_id(&subject_id, "Great mentor", &date);

  let reply = c.handle(SESSION, text("Great mentor")).await;
  assert!(reply.text.contains(review_id.as_str()));
  let Some(State::Confirm { draft, .. }) = c.state(SESSION).await else {
    panic!("expected confirm state");
  };
  assert_eq!(draft.review_id, review_id);

  let reply = c.handle(SESSION, text("abc")).await;
  assert!(reply.text.contains(review_id.as_str()));
  assert_eq!(reply.actions, Action::EXISTING);
  assert!(matches!(c.state(SESSION).await, Some(State::Menu { exists: true, .. })));

  let store = c.ingestor().store();
  let reviews = store.reviews_for(&subject_id).await.unwrap();
  assert_eq!(reviews.len(), 1);
  assert_eq!(reviews[0].source, SourceCategory::Chat);
  assert!(reviews[0].is_authored_by("abc"));
  assert_eq!(store.verify_authorship(&review_id, "abd").await.unwrap(), Some(false));
}

#[tokio::test]
async fn view_lists_reviews_in_order() {
  let c = controller().await;
  let subject = derive_subject_id("Tsinghua", "CS", "Prof. A");
  for (body, date) in [("kind<br>patient", "2019-01-01"), ("slow replies", "2020-01-01")] {
    c.ingestor()
      .store()
      .insert_review(Review::new(subject.clone(), body, date, SourceCategory::Urfire, ReviewType::Teacher))
      .await
      .unwrap();
  }

  walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. A")).await;
  let reply = c.handle(SESSION, Input::Select(Action::View)).await;

  let first = reply.text.find("kind\npatient").expect("first review shown");
  let second = reply.text.find("slow replies").expect("second review shown");
  assert!(first < second);
  assert!(reply.text.contains("\n---\n"));
  assert!(matches!(c.state(SESSION).await, Some(State::Menu { .. })));
}

#[tokio::test]
async fn view_without_reviews_says_so() {
  let c = controller().await;
  walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. B")).await;
  let reply = c.handle(SESSION, Input::Select(Action::View)).await;
  assert!(reply.text.contains("No reviews"));
}

#[tokio::test]
async fn details_show_info() {
  let c = controller().await;
  walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. A")).await;
  let reply = c.handle(SESSION, Input::Select(Action::Details)).await;
  assert!(reply.text.contains("Homepage: https://a.example"));

  walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. B")).await;
  let reply = c.handle(SESSION, Input::Select(Action::Details)).await;
  assert!(reply.text.contains("No details"));
}

#[tokio::test]
async fn end_action_discards_session() {
  let c = controller().await;
  walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. A")).await;

  let reply = c.handle(SESSION, Input::Select(Action::End)).await;
  assert!(reply.ended);
  assert_eq!(c.state(SESSION).await, None);
  assert_eq!(c.active_sessions().await, 0);
}

// ─── Cancellation & protocol errors ──────────────────────────────────────────

#[tokio::test]
async fn every_state_cancels_to_end() {
  let full: Vec<Input> = vec![
    Input::Start,
    text("U.S."),
    text("Test University"),
    text("CS"),
    text("Dr. X"),
    Input::Select(Action::CreateSubject),
    Input::Select(Action::AddReview),
    text("Great mentor"),
  ];

  // Prefix lengths 1..=8 leave the session in Category, Institution,
  // Department, Subject, Menu (unknown), Menu (existing), Compose, Confirm.
  for len in 1..=full.len() {
    let c = controller().await;
    walk(&c, &full[..len]).await;
    assert!(c.state(SESSION).await.is_some(), "prefix {len} has a session");

    let reply = c.cancel(SESSION).await;
    assert!(reply.ended, "prefix {len} ended");
    assert_eq!(c.state(SESSION).await, None, "prefix {len} cleared");
  }
}

#[tokio::test]
async fn cancel_in_confirm_publishes_nothing() {
  let c = controller().await;
  walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. B")).await;
  walk(&c, &[Input::Select(Action::AddReview), text("draft only")]).await;
  c.cancel(SESSION).await;

  let id = derive_subject_id("Tsinghua", "CS", "Prof. B");
  assert!(c.ingestor().store().reviews_for(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn help_and_info_leave_state_alone() {
  let c = controller().await;

  // Without a session: answered, nothing opened.
  assert!(!c.handle(SESSION, Input::Help).await.text.is_empty());
  assert_eq!(c.active_sessions().await, 0);

  walk(&c, &[Input::Start, text("985")]).await;
  let before = c.state(SESSION).await;
  c.handle(SESSION, Input::Help).await;
  c.handle(SESSION, Input::Info).await;
  assert_eq!(c.state(SESSION).await, before);
}

#[tokio::test]
async fn text_without_session_is_rejected() {
  let c = controller().await;
  let reply = c.handle(SESSION, text("985")).await;
  assert!(reply.ended);
  assert_eq!(c.active_sessions().await, 0);
}

#[tokio::test]
async fn wrong_input_kind_reprompts() {
  let c = controller().await;
  c.handle(SESSION, Input::Start).await;

  c.handle(SESSION, Input::Select(Action::View)).await;
  assert_eq!(c.state(SESSION).await, Some(State::Category));

  c.handle(SESSION, text("   ")).await;
  assert_eq!(c.state(SESSION).await, Some(State::Category));

  walk(&c, &[text("985"), text("Tsinghua"), text("CS"), text("Prof. Z")]).await;
  let before = c.state(SESSION).await;
  // Not on the menu of an unknown subject.
  let reply = c.handle(SESSION, Input::Select(Action::View)).await;
  assert_eq!(reply.actions, Action::UNKNOWN);
  c.handle(SESSION, text("hello")).await;
  assert_eq!(c.state(SESSION).await, before);
}

#[tokio::test]
async fn start_restarts_the_walk() {
  let c = controller().await;
  walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. A")).await;
  c.handle(SESSION, Input::Start).await;
  assert_eq!(c.state(SESSION).await, Some(State::Category));
}

#[tokio::test]
async fn sessions_are_independent() {
  let c = controller().await;
  c.handle("a", Input::Start).await;
  c.handle("b", Input::Start).await;
  c.handle("a", text("985")).await;

  assert!(matches!(c.state("a").await, Some(State::Institution { .. })));
  assert_eq!(c.state("b").await, Some(State::Category));

  c.cancel("a").await;
  assert_eq!(c.state("a").await, None);
  assert_eq!(c.state("b").await, Some(State::Category));
}

// ─── Session lifetime ────────────────────────────────────────────────────────

#[tokio::test]
async fn idle_sessions_expire() {
  let ttl = Duration::from_millis(300);
  let c = controller().await.with_session_ttl(ttl);
  for id in ["a", "b", "c"] {
    c.handle(id, Input::Start).await;
  }
  assert_eq!(c.active_sessions().await, 3);

  tokio::time::sleep(Duration::from_millis(200)).await;
  c.handle("a", text("985")).await;

  tokio::time::sleep(Duration::from_millis(200)).await;
  assert_eq!(c.evict_idle().await, 2);
  assert_eq!(c.active_sessions().await, 1);
  assert!(matches!(c.state("a").await, Some(State::Institution { .. })));

  let reply = c.handle("b", text("985")).await;
  assert!(reply.ended);
  assert_eq!(c.state("b").await, None);
}

#[tokio::test]
async fn abandoned_sessions_do_not_accumulate() {
  let c = controller().await.with_session_ttl(Duration::from_millis(50));
  for i in 0..200 {
    c.handle(&format!("chat-{i}"), Input::Start).await;
  }
  tokio::time::sleep(Duration::from_millis(100)).await;
  assert_eq!(c.active_sessions().await, 0);
}

#[tokio::test]
async fn default_ttl_is_one_day() {
  let c = controller().await;
  assert_eq!(c.session_ttl(), DEFAULT_SESSION_TTL);
  assert_eq!(DEFAULT_SESSION_TTL, Duration::from_secs(86_400));
}

#[tokio::test]
async fn ending_a_stale_slot_keeps_the_reopened_session() {
  let c = controller().await;
  c.handle(SESSION, Input::Start).await;
  let stale = c.slot(SESSION).await.unwrap();

  c.cancel(SESSION).await;
  c.handle(SESSION, Input::Start).await;
  c.handle(SESSION, text("985")).await;

  c.close(SESSION, &stale).await;
  assert!(matches!(c.state(SESSION).await, Some(State::Institution { .. })));

  let current = c.slot(SESSION).await.unwrap();
  c.close(SESSION, &current).await;
  assert_eq!(c.state(SESSION).await, None);
}

// ─── Store failures ──────────────────────────────────────────────────────────

/// Delegates to an in-memory store, failing every call while `broken`.
struct FlakyStore {
  inner:  SqliteStore,
  broken: AtomicBool,
}

impl FlakyStore {
  fn check(&self) -> Result<(), std::io::Error> {
    if self.broken.load(Ordering::SeqCst) {
      Err(std::io::Error::other("store unavailable"))
    } else {
      Ok(())
    }
  }
}

fn io(e: safc_store_sqlite::Error) -> std::io::Error { std::io::Error::other(e) }

impl ReviewStore for FlakyStore {
  type Error = std::io::Error;

  async fn upsert_subject(&self, subject: Subject) -> Result<(ContentId, bool), Self::Error> {
    self.check()?;
    self.inner.upsert_subject(subject).await.map_err(io)
  }

  async fn insert_review(&self, review: Review) -> Result<(ContentId, bool), Self::Error> {
    self.check()?;
    self.inner.insert_review(review).await.map_err(io)
  }

  async fn get_subject(&self, id: &ContentId) -> Result<Option<Subject>, Self::Error> {
    self.check()?;
    self.inner.get_subject(id).await.map_err(io)
  }

  async fn get_review(&self, id: &ContentId) -> Result<Option<Review>, Self::Error> {
    self.check()?;
    self.inner.get_review(id).await.map_err(io)
  }

  async fn ref_kind(&self, id: &ContentId) -> Result<Option<RefKind>, Self::Error> {
    self.check()?;
    self.inner.ref_kind(id).await.map_err(io)
  }

  async fn categories(&self) -> Result<Vec<String>, Self::Error> {
    self.check()?;
    self.inner.categories().await.map_err(io)
  }

  async fn institutions(&self, category: &str) -> Result<Vec<String>, Self::Error> {
    self.check()?;
    self.inner.institutions(category).await.map_err(io)
  }

  async fn departments(&self, category: &str, institution: &str) -> Result<Vec<String>, Self::Error> {
    self.check()?;
    self.inner.departments(category, institution).await.map_err(io)
  }

  async fn subject_names(&self, institution: &str, department: &str) -> Result<Vec<String>, Self::Error> {
    self.check()?;
    self.inner.subject_names(institution, department).await.map_err(io)
  }

  async fn category_for_institution(&self, institution: &str) -> Result<Option<String>, Self::Error> {
    self.check()?;
    self.inner.category_for_institution(institution).await.map_err(io)
  }

  async fn reviews_for(&self, subject_ref: &ContentId) -> Result<Vec<Review>, Self::Error> {
    self.check()?;
    self.inner.reviews_for(subject_ref).await.map_err(io)
  }

  async fn search_subjects(&self, pattern: &str) -> Result<Vec<Subject>, Self::Error> {
    self.check()?;
    self.inner.search_subjects(pattern).await.map_err(io)
  }

  async fn search_reviews(&self, pattern: &str) -> Result<Vec<Review>, Self::Error> {
    self.check()?;
    self.inner.search_reviews(pattern).await.map_err(io)
  }

  async fn stats(&self, since: NaiveDate) -> Result<StoreStats, Self::Error> {
    self.check()?;
    self.inner.stats(since).await.map_err(io)
  }

  async fn export_to(&self, dest: &std::path::Path) -> Result<(), Self::Error> {
    self.check()?;
    self.inner.export_to(dest).await.map_err(io)
  }
}

#[tokio::test]
async fn store_failure_keeps_state_and_asks_to_retry() {
  let store = Arc::new(FlakyStore { inner: seeded_store().await, broken: AtomicBool::new(false) });
  let c = Controller::new(Arc::new(Ingestor::new(store.clone(), CategoryRules::default())));

  walk(&c, &to_subject("985", "Tsinghua", "CS", "Prof. Z")).await;
  let before = c.state(SESSION).await;

  store.broken.store(true, Ordering::SeqCst);
  let reply = c.handle(SESSION, Input::Select(Action::CreateSubject)).await;
  assert!(!reply.ended);
  assert_eq!(reply.actions, Action::UNKNOWN);
  assert_eq!(c.state(SESSION).await, before);

  store.broken.store(false, Ordering::SeqCst);
  let reply = c.handle(SESSION, Input::Select(Action::CreateSubject)).await;
  assert_eq!(reply.actions, Action::EXISTING);

  let path = SubjectPath {
    category:    "985".into(),
    institution: "Tsinghua".into(),
    department:  "CS".into(),
    name:        "Prof. Z".into(),
  };
  assert!(store.get_subject(&path.subject_id()).await.unwrap().is_some());
}
