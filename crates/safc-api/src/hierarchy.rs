//! Handlers for the four hierarchy levels.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories` | |
//! | `GET`  | `/institutions` | `?category=` |
//! | `GET`  | `/departments` | `?category=&institution=` |
//! | `GET`  | `/subject-names` | `?institution=&department=` |

use axum::{
  Json,
  extract::{Query, State},
};
use safc_core::store::ReviewStore;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct InstitutionParams {
  pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentParams {
  pub category:    String,
  pub institution: String,
}

#[derive(Debug, Deserialize)]
pub struct NameParams {
  pub institution: String,
  pub department:  String,
}

/// `GET /categories`
pub async fn categories<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<String>>, ApiError> {
  let values = state.store.categories().await.map_err(ApiError::store)?;
  Ok(Json(values))
}

/// `GET /institutions?category=<c>`
pub async fn institutions<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Query(params): Query<InstitutionParams>,
) -> Result<Json<Vec<String>>, ApiError> {
  let values = state
    .store
    .institutions(&params.category)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(values))
}

/// `GET /departments?category=<c>&institution=<i>`
pub async fn departments<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Query(params): Query<DepartmentParams>,
) -> Result<Json<Vec<String>>, ApiError> {
  let values = state
    .store
    .departments(&params.category, &params.institution)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(values))
}

/// `GET /subject-names?institution=<i>&department=<d>`
pub async fn subject_names<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Query(params): Query<NameParams>,
) -> Result<Json<Vec<String>>, ApiError> {
  let values = state
    .store
    .subject_names(&params.institution, &params.department)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(values))
}
