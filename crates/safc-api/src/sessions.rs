//! Dialog sessions over HTTP. Every route requires the transport token.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/sessions` | opens a session; returns its id and the first reply |
//! | `POST`   | `/sessions/{id}/messages` | Body: an `Input`, e.g. `{"type":"text","value":"985"}` |
//! | `DELETE` | `/sessions/{id}` | cancels the session |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use safc_core::store::ReviewStore;
use safc_dialog::{Input, Reply};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated};

#[derive(Debug, Serialize, Deserialize)]
pub struct Opened {
  pub session: String,
  pub reply:   Reply,
}

/// `POST /sessions`
pub async fn open<S: ReviewStore + 'static>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
) -> impl IntoResponse {
  let session = Uuid::new_v4().to_string();
  let reply = state.dialog.handle(&session, Input::Start).await;
  (StatusCode::CREATED, Json(Opened { session, reply }))
}

/// `POST /sessions/{id}/messages`
pub async fn message<S: ReviewStore + 'static>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(session): Path<String>,
  Json(input): Json<Input>,
) -> Json<Reply> {
  Json(state.dialog.handle(&session, input).await)
}

/// `DELETE /sessions/{id}`
pub async fn cancel<S: ReviewStore + 'static>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(session): Path<String>,
) -> Json<Reply> {
  Json(state.dialog.cancel(&session).await)
}
