//! Web review submission.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/submissions` | creates the subject on demand; rate limited |
//!
//! Body:
//!
//! ```json
//! {"category": "985", "institution": "Tsinghua", "department": "CS",
//!  "name": "Prof. A", "body": "...", "otp": "optional"}
//! ```

use axum::{Json, extract::State, http::StatusCode};
use safc_core::{store::ReviewStore, subject::SubjectPath};
use safc_ingest::WebSubmission;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SubmissionBody {
  pub category:    String,
  pub institution: String,
  pub department:  String,
  pub name:        String,
  pub body:        String,
  #[serde(default)]
  pub otp:         Option<String>,
}

/// `POST /submissions`. `201` for a new review, `200` when the identical
/// review was already stored.
pub async fn submit<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  Json(submission): Json<SubmissionBody>,
) -> Result<(StatusCode, Json<WebSubmission>), ApiError> {
  let SubmissionBody { category, institution, department, name, body, otp } = submission;

  let blank = [
    ("category", &category),
    ("institution", &institution),
    ("department", &department),
    ("name", &name),
    ("body", &body),
  ]
  .into_iter()
  .find(|(_, value)| value.trim().is_empty());
  if let Some((field, _)) = blank {
    return Err(ApiError::BadRequest(format!("{field} must not be empty")));
  }

  let path = SubjectPath { category, institution, department, name };
  let outcome = state
    .dialog
    .ingestor()
    .submit_web_review(&path, body, otp.as_deref())
    .await
    .map_err(ApiError::store)?;

  let status = if outcome.review_created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(outcome)))
}
