//! Handlers for `/reviews` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reviews` | `?q=<LIKE pattern>` over bodies |
//! | `GET`  | `/reviews/{id}` | 404 if not found |
//! | `GET`  | `/reviews/{id}/replies` | nested reviews of a review |
//! | `POST` | `/reviews/{id}/verify` | Body: `{"otp":"..."}` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use safc_core::{ContentId, review::Review, store::{RefKind, ReviewStore}};
use serde::{Deserialize, Serialize};

use crate::{AppState, SearchParams, error::ApiError, parse_id};

/// `GET /reviews?q=<pattern>`
pub async fn search<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Review>>, ApiError> {
  let reviews = state
    .store
    .search_reviews(&params.pattern())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reviews))
}

/// `GET /reviews/{id}`
pub async fn get_one<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Review>, ApiError> {
  let id = parse_id(&id)?;
  let review = state
    .store
    .get_review(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("review {id} not found")))?;
  Ok(Json(review))
}

/// `GET /reviews/{id}/replies`
pub async fn replies<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
  let id = parse_id(&id)?;
  match state.store.ref_kind(&id).await.map_err(ApiError::store)? {
    Some(RefKind::Review) => {}
    Some(RefKind::Subject) => {
      return Err(ApiError::BadRequest(format!("{id} is a subject; use /subjects/{id}/reviews")));
    }
    None => return Err(ApiError::NotFound(format!("review {id} not found"))),
  }
  let replies = state.store.reviews_for(&id).await.map_err(ApiError::store)?;
  Ok(Json(replies))
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub otp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Verification {
  pub review_id: ContentId,
  pub verified:  bool,
}

/// `POST /reviews/{id}/verify` — body: `{"otp":"..."}`
pub async fn verify<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<VerifyBody>,
) -> Result<Json<Verification>, ApiError> {
  let id = parse_id(&id)?;
  let verified = state
    .store
    .verify_authorship(&id, &body.otp)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("review {id} not found")))?;
  Ok(Json(Verification { review_id: id, verified }))
}
