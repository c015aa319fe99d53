//! [`Controller`] — drives one [`State`] machine per session.
//!
//! Sessions are keyed by an opaque id chosen by the transport. Inputs for one
//! session are applied one at a time; different sessions run concurrently.
//! A store failure leaves the session where it was and asks the user to
//! retry. Reaching [`State::End`] removes the session, and a session left
//! idle for longer than the TTL is dropped.

use std::{collections::HashMap, sync::Arc, time::Duration};

use safc_core::{
  ContentId,
  id::derive_review_id,
  store::ReviewStore,
  subject::SubjectPath,
  today,
};
use safc_ingest::Ingestor;
use tokio::{sync::Mutex, time::Instant};

use crate::{
  message::{Action, Input, Reply},
  state::{Draft, State},
  text,
};

type Step<E> = Result<(State, Reply), E>;
type Slot = Arc<Mutex<State>>;

/// How long an untouched session is kept: one day.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Session {
  slot:    Slot,
  touched: Instant,
}

pub struct Controller<S> {
  ingestor: Arc<Ingestor<S>>,
  ttl:      Duration,
  sessions: Mutex<HashMap<String, Session>>,
}

impl<S: ReviewStore> Controller<S> {
  pub fn new(ingestor: Arc<Ingestor<S>>) -> Self {
    Self { ingestor, ttl: DEFAULT_SESSION_TTL, sessions: Mutex::new(HashMap::new()) }
  }

  pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn ingestor(&self) -> &Arc<Ingestor<S>> { &self.ingestor }

  pub fn session_ttl(&self) -> Duration { self.ttl }

  /// Sessions that are open and not yet idle past the TTL.
  pub async fn active_sessions(&self) -> usize {
    let mut sessions = self.sessions.lock().await;
    sweep(&mut sessions, self.ttl);
    sessions.len()
  }

  /// Drop every session idle for longer than the TTL. Returns how many went.
  pub async fn evict_idle(&self) -> usize {
    let evicted = sweep(&mut *self.sessions.lock().await, self.ttl);
    if evicted > 0 {
      tracing::debug!(evicted, "idle sessions evicted");
    }
    evicted
  }

  /// Current state of `session`, if it is active.
  pub async fn state(&self, session: &str) -> Option<State> {
    let slot = self.slot(session).await?;
    let state = slot.lock().await;
    Some(state.clone())
  }

  /// Apply one input to `session` and answer it.
  ///
  /// `Start` opens the session if needed. `Help` and `Info` are answered in
  /// any state without touching it.
  pub async fn handle(&self, session: &str, input: Input) -> Reply {
    let slot = match self.touch(session).await {
      Some(slot) => slot,
      None => match input {
        Input::Start => self.open(session).await,
        Input::Help => return Reply::text(text::HELP),
        Input::Info => return Reply::text(text::ABOUT),
        _ => return Reply::text(text::NO_SESSION).ended(),
      },
    };

    let mut state = slot.lock().await;
    match self.step(&state, input).await {
      Ok((next, reply)) => {
        tracing::debug!(session, from = state.name(), to = next.name(), "session transition");
        if next.is_end() {
          self.close(session, &slot).await;
        }
        *state = next;
        reply
      }
      Err(e) => {
        tracing::error!(session, state = state.name(), error = %e, "store error in session");
        let reply = Reply::text(text::STORE_RETRY);
        match &*state {
          State::Menu { exists, .. } => reply.with_actions(Action::menu(*exists)),
          _ => reply,
        }
      }
    }
  }

  /// Cancel `session` from whatever state it is in.
  pub async fn cancel(&self, session: &str) -> Reply { self.handle(session, Input::Cancel).await }

  async fn open(&self, session: &str) -> Slot {
    tracing::debug!(session, "session opened");
    let now = Instant::now();
    self
      .sessions
      .lock()
      .await
      .entry(session.to_owned())
      .or_insert_with(|| Session { slot: Arc::new(Mutex::new(State::Category)), touched: now })
      .slot
      .clone()
  }

  /// The live slot for `session`, without refreshing it.
  pub(crate) async fn slot(&self, session: &str) -> Option<Slot> {
    let mut sessions = self.sessions.lock().await;
    sweep(&mut sessions, self.ttl);
    sessions.get(session).map(|s| s.slot.clone())
  }

  /// The live slot for `session`, marking it as used now.
  async fn touch(&self, session: &str) -> Option<Slot> {
    let mut sessions = self.sessions.lock().await;
    sweep(&mut sessions, self.ttl);
    let entry = sessions.get_mut(session)?;
    entry.touched = Instant::now();
    Some(entry.slot.clone())
  }

  /// Remove `session` if `slot` is still the one registered under it. A
  /// session reopened under the same id in the meantime is left alone.
  pub(crate) async fn close(&self, session: &str, slot: &Slot) {
    let mut sessions = self.sessions.lock().await;
    if sessions.get(session).is_some_and(|s| Arc::ptr_eq(&s.slot, slot)) {
      sessions.remove(session);
    }
  }

  // ─── Transitions ──────────────────────────────────────────────────────────

  async fn step(&self, state: &State, input: Input) -> Step<S::Error> {
    let keep = |reply: Reply| Ok((state.clone(), reply));

    match (state, input) {
      (_, Input::Cancel) => Ok((State::End, Reply::text(text::CANCELLED).ended())),
      (_, Input::Help) => keep(Reply::text(text::HELP)),
      (_, Input::Info) => keep(Reply::text(text::ABOUT)),
      (State::End, _) => Ok((State::End, Reply::text(text::NO_SESSION).ended())),
      (_, Input::Start) => self.enter_category().await,

      (State::Menu { path, subject_id, exists }, Input::Select(action))
        if Action::menu(*exists).contains(&action) =>
      {
        self.menu_action(path, subject_id, action).await
      }
      (State::Menu { exists, .. }, _) => {
        keep(Reply::text(text::EXPECT_ACTION).with_actions(Action::menu(*exists)))
      }

      (_, Input::Select(_)) => keep(Reply::text(text::EXPECT_TEXT)),
      (_, Input::Text(t)) if t.trim().is_empty() => keep(Reply::text(text::EMPTY_TEXT)),

      (State::Category, Input::Text(category)) => {
        let institutions = self.store().institutions(&category).await?;
        let reply = Reply::text(format!("{category}\nWhich institution?")).with_suggestions(institutions);
        Ok((State::Institution { category }, reply))
      }

      (State::Institution { category }, Input::Text(institution)) => {
        let departments = self.store().departments(category, &institution).await?;
        let reply = Reply::text(format!(
          "{}\nWhich department?",
          text::breadcrumb(&[category.as_str(), institution.as_str()])
        ))
        .with_suggestions(departments);
        Ok((State::Department { category: category.clone(), institution }, reply))
      }

      (State::Department { category, institution }, Input::Text(department)) => {
        let names = self.store().subject_names(institution, &department).await?;
        let reply = Reply::text(format!(
          "{}\nWhich supervisor or other subject?",
          text::breadcrumb(&[category.as_str(), institution.as_str(), department.as_str()])
        ))
        .with_suggestions(names);
        Ok((
          State::Subject {
            category: category.clone(),
            institution: institution.clone(),
            department,
          },
          reply,
        ))
      }

      (State::Subject { category, institution, department }, Input::Text(name)) => {
        let path = SubjectPath {
          category:    category.clone(),
          institution: institution.clone(),
          department:  department.clone(),
          name,
        };
        self.resolve_subject(path).await
      }

      (State::Compose { path, subject_id }, Input::Text(body)) => {
        let date = today();
        let review_id = derive_review_id(subject_id, &body, &date);
        let reply = Reply::text(format!(
          "{}\nYour review:\n{body}\nid: {review_id} | date: {date}\n\n\
           To publish, send a publisher OTP. It lets you prove later that you \
           wrote this review; send any throwaway value if you do not need that. \
           Send cancel to discard the review.",
          text::path_breadcrumb(path)
        ));
        let draft = Draft { body, date, review_id };
        Ok((State::Confirm { path: path.clone(), subject_id: subject_id.clone(), draft }, reply))
      }

      (State::Confirm { path, subject_id, draft }, Input::Text(otp)) => {
        let (review, created) = self
          .ingestor
          .publish_review(subject_id.clone(), draft.body.clone(), draft.date.clone(), &otp)
          .await?;
        let message = if created {
          format!(
            "Your OTP has been discarded.\nReview {} published. Thank you for contributing!",
            review.id
          )
        } else {
          format!("An identical review {} is already published.", review.id)
        };
        let reply = Reply::text(message).with_actions(&Action::EXISTING);
        Ok((
          State::Menu { path: path.clone(), subject_id: subject_id.clone(), exists: true },
          reply,
        ))
      }
    }
  }

  fn store(&self) -> &S { self.ingestor.store() }

  async fn enter_category(&self) -> Step<S::Error> {
    let categories = self.store().categories().await?;
    Ok((State::Category, Reply::text(text::GREETING).with_suggestions(categories)))
  }

  async fn resolve_subject(&self, path: SubjectPath) -> Step<S::Error> {
    let subject_id = path.subject_id();
    let exists = self.store().get_subject(&subject_id).await?.is_some();

    let prompt = if exists {
      "Choose an action:"
    } else {
      "There is no information on this subject yet. Add it?"
    };
    let reply = Reply::text(format!("{}\n{prompt}", text::path_breadcrumb(&path)))
      .with_actions(Action::menu(exists));
    Ok((State::Menu { path, subject_id, exists }, reply))
  }

  async fn menu_action(&self, path: &SubjectPath, subject_id: &ContentId, action: Action) -> Step<S::Error> {
    let menu = |exists: bool| State::Menu { path: path.clone(), subject_id: subject_id.clone(), exists };

    match action {
      Action::View => {
        let reviews = self.store().reviews_for(subject_id).await?;
        let body = if reviews.is_empty() {
          "No reviews for this subject yet.".to_owned()
        } else {
          text::review_list(&reviews)
        };
        let reply = Reply::text(format!("Reviews of {}\n{body}", path.name)).with_actions(&Action::EXISTING);
        Ok((menu(true), reply))
      }

      Action::Details => {
        let info = self
          .store()
          .get_subject(subject_id)
          .await?
          .and_then(|subject| subject.info)
          .unwrap_or_else(|| "No details recorded for this subject.".to_owned());
        let reply = Reply::text(format!("{}\n{info}", text::path_breadcrumb(path)))
          .with_actions(&Action::EXISTING);
        Ok((menu(true), reply))
      }

      Action::AddReview => {
        let reply = Reply::text(format!(
          "{}\nWrite your review of this subject. For your privacy, do not do this in a group chat.",
          text::path_breadcrumb(path)
        ));
        Ok((State::Compose { path: path.clone(), subject_id: subject_id.clone() }, reply))
      }

      Action::CreateSubject => {
        self.ingestor.create_subject(path).await?;
        let reply = Reply::text(format!(
          "{}\nSubject added. Thank you for contributing!",
          text::path_breadcrumb(path)
        ))
        .with_actions(&Action::EXISTING);
        Ok((menu(true), reply))
      }

      Action::End => Ok((State::End, Reply::text(text::FINISHED).ended())),
    }
  }
}

/// Drop sessions idle for at least `ttl`, returning how many were dropped.
fn sweep(sessions: &mut HashMap<String, Session>, ttl: Duration) -> usize {
  let now = Instant::now();
  let before = sessions.len();
  sessions.retain(|_, s| now.duration_since(s.touched) < ttl);
  before - sessions.len()
}
