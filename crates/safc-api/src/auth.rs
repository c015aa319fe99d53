//! Bearer-token extractor guarding the dialog session endpoints.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use safc_core::store::ReviewStore;

use crate::{AppState, error::ApiError};

/// The transport token a chat front end must present.
#[derive(Clone)]
pub struct AuthConfig {
  /// An empty token rejects every request.
  pub transport_token: String,
}

/// Zero-size marker: present in the handler means the request was authenticated.
pub struct Authenticated;

/// Check the `Authorization: Bearer <token>` header against `config`.
pub fn verify_bearer(headers: &HeaderMap, config: &AuthConfig) -> Result<(), ApiError> {
  let presented = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(ApiError::Unauthorized)?;

  let expected = config.transport_token.as_bytes();
  let matches = !expected.is_empty()
    && presented.len() == expected.len()
    && presented
      .bytes()
      .zip(expected)
      .fold(0u8, |acc, (a, b)| acc | (a ^ b))
      == 0;

  if matches { Ok(()) } else { Err(ApiError::Unauthorized) }
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: ReviewStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_bearer(&parts.headers, &state.auth)?;
    Ok(Authenticated)
  }
}
