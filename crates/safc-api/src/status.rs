//! Handler for `GET /status`.

use axum::{Json, extract::State};
use chrono::{Days, Local};
use safc_core::store::{ReviewStore, StoreStats};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Window for the "recent" counters.
pub const RECENT_DAYS: u64 = 365;

#[derive(Debug, Serialize, Deserialize)]
pub struct Status {
  #[serde(flatten)]
  pub store:           StoreStats,
  pub recent_days:     u64,
  pub active_sessions: usize,
}

/// `GET /status`
pub async fn handler<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
) -> Result<Json<Status>, ApiError> {
  let today = Local::now().date_naive();
  let since = today.checked_sub_days(Days::new(RECENT_DAYS)).unwrap_or(today);
  let store = state.store.stats(since).await.map_err(ApiError::store)?;
  Ok(Json(Status {
    store,
    recent_days: RECENT_DAYS,
    active_sessions: state.dialog.active_sessions().await,
  }))
}
