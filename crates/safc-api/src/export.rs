//! Open-data dump of the whole store.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/download/db` | the store as a SQLite file attachment |

use axum::{
  extract::State,
  http::{HeaderValue, header},
  response::{IntoResponse, Response},
};
use safc_core::store::ReviewStore;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /download/db`
pub async fn download<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
) -> Result<Response, ApiError> {
  let staging = std::env::temp_dir().join(format!("safc-export-{}.db", Uuid::new_v4()));
  state.store.export_to(&staging).await.map_err(ApiError::store)?;

  let bytes = tokio::fs::read(&staging).await;
  if let Err(e) = tokio::fs::remove_file(&staging).await {
    tracing::warn!(error = %e, path = %staging.display(), "failed to remove export copy");
  }
  let bytes = bytes.map_err(ApiError::store)?;
  tracing::info!(bytes = bytes.len(), "store dump downloaded");

  let mut res = bytes.into_response();
  let headers = res.headers_mut();
  headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
  headers.insert(
    header::CONTENT_DISPOSITION,
    HeaderValue::from_static("attachment; filename=\"safc.db\""),
  );
  Ok(res)
}
