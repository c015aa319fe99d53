//! JSON HTTP API for the SAFC review store.
//!
//! Exposes an axum [`Router`] backed by any [`safc_core::store::ReviewStore`]:
//! read-only queries over the hierarchy, subjects and reviews, authorship
//! verification, web review submission, the open-data dump, and the guided
//! dialog for chat front ends. Only the dialog routes require the transport
//! token. Public `POST` routes are limited per client per day (see [`limit`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", safc_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod limit;
pub mod reviews;
pub mod sessions;
pub mod status;
pub mod subjects;
pub mod submissions;

use std::sync::Arc;

use axum::{
  Router,
  middleware,
  routing::{get, post},
};
use safc_core::{ContentId, store::ReviewStore};
use safc_dialog::Controller;
use serde::Deserialize;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use limit::PostLimiter;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub dialog:  Arc<Controller<S>>,
  pub auth:    Arc<AuthConfig>,
  pub limiter: Arc<PostLimiter>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      dialog:  Arc::clone(&self.dialog),
      auth:    Arc::clone(&self.auth),
      limiter: Arc::clone(&self.limiter),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: ReviewStore + 'static,
{
  // Public writes, counted per client.
  let limited = Router::new()
    .route("/submissions", post(submissions::submit::<S>))
    .route("/reviews/{id}/verify", post(reviews::verify::<S>))
    .route_layer(middleware::from_fn_with_state(state.clone(), limit::limit_posts::<S>));

  Router::new()
    // Hierarchy
    .route("/categories", get(hierarchy::categories::<S>))
    .route("/institutions", get(hierarchy::institutions::<S>))
    .route("/departments", get(hierarchy::departments::<S>))
    .route("/subject-names", get(hierarchy::subject_names::<S>))
    // Subjects
    .route("/subjects", get(subjects::search::<S>))
    .route("/subjects/{id}", get(subjects::get_one::<S>))
    .route("/subjects/{id}/reviews", get(subjects::reviews::<S>))
    // Reviews
    .route("/reviews", get(reviews::search::<S>))
    .route("/reviews/{id}", get(reviews::get_one::<S>))
    .route("/reviews/{id}/replies", get(reviews::replies::<S>))
    // Status
    .route("/status", get(status::handler::<S>))
    .route("/download/db", get(export::download::<S>))
    // Dialog
    .route("/sessions", post(sessions::open::<S>))
    .route("/sessions/{id}", axum::routing::delete(sessions::cancel::<S>))
    .route("/sessions/{id}/messages", post(sessions::message::<S>))
    .merge(limited)
    .with_state(state)
}

// ─── Shared extractors ───────────────────────────────────────────────────────

/// `?q=` for the search endpoints. A query containing `%` or `_` is used as
/// a SQL `LIKE` pattern verbatim; anything else matches as a substring.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub q: String,
}

impl SearchParams {
  pub fn pattern(&self) -> String {
    if self.q.contains(['%', '_']) { self.q.clone() } else { format!("%{}%", self.q) }
  }
}

fn parse_id(raw: &str) -> Result<ContentId, ApiError> {
  ContentId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}
