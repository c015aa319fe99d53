//! Handlers for `/subjects` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subjects` | `?q=<LIKE pattern>` over names |
//! | `GET`  | `/subjects/{id}` | 404 if not found |
//! | `GET`  | `/subjects/{id}/reviews` | top-level reviews, insertion order |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use safc_core::{review::Review, store::ReviewStore, subject::Subject};

use crate::{AppState, SearchParams, error::ApiError, parse_id};

/// `GET /subjects?q=<pattern>`
pub async fn search<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  let subjects = state
    .store
    .search_subjects(&params.pattern())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subjects))
}

/// `GET /subjects/{id}`
pub async fn get_one<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Subject>, ApiError> {
  let id = parse_id(&id)?;
  let subject = state
    .store
    .get_subject(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

/// `GET /subjects/{id}/reviews`
pub async fn reviews<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
  let id = parse_id(&id)?;
  if state.store.get_subject(&id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("subject {id} not found")));
  }
  let reviews = state.store.reviews_for(&id).await.map_err(ApiError::store)?;
  Ok(Json(reviews))
}
