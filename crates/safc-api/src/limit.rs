//! Per-client daily limit on public `POST` requests.
//!
//! The client is identified by `X-Real-IP`, then the first `X-Forwarded-For`
//! hop (set by the reverse proxy), then the socket peer when the server was
//! started with connect info. A request with none of these is rejected.
//! Counters reset together once the window has elapsed.

use std::{
  collections::HashMap,
  net::SocketAddr,
  time::{Duration, Instant},
};

use axum::{
  extract::{ConnectInfo, Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};
use safc_core::store::ReviewStore;
use tokio::sync::Mutex;

use crate::{AppState, error::ApiError};

pub const MAX_POSTS_PER_DAY: u64 = 20;
pub const LIMIT_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

pub struct PostLimiter {
  max:    u64,
  window: Duration,
  counts: Mutex<Counts>,
}

struct Counts {
  since:      Instant,
  per_client: HashMap<String, u64>,
}

impl Default for PostLimiter {
  fn default() -> Self { Self::new(MAX_POSTS_PER_DAY, LIMIT_WINDOW) }
}

impl PostLimiter {
  pub fn new(max: u64, window: Duration) -> Self {
    Self {
      max,
      window,
      counts: Mutex::new(Counts { since: Instant::now(), per_client: HashMap::new() }),
    }
  }

  /// Count one request from `client`; `false` once it is over the limit.
  pub async fn admit(&self, client: &str) -> bool {
    let mut counts = self.counts.lock().await;
    if counts.since.elapsed() >= self.window {
      counts.per_client.clear();
      counts.since = Instant::now();
    }
    let count = counts.per_client.entry(client.to_owned()).or_insert(0);
    *count += 1;
    *count <= self.max
  }
}

/// The client address as reported by the reverse proxy.
pub fn forwarded_client(headers: &HeaderMap) -> Option<String> {
  let real_ip = headers
    .get("x-real-ip")
    .and_then(|v| v.to_str().ok())
    .map(str::trim);
  let forwarded = headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .map(str::trim);
  real_ip
    .filter(|v| !v.is_empty())
    .or(forwarded.filter(|v| !v.is_empty()))
    .map(str::to_owned)
}

/// Middleware for the rate-limited routes.
pub async fn limit_posts<S: ReviewStore + 'static>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Response {
  let peer = req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip().to_string());
  let Some(client) = forwarded_client(req.headers()).or(peer) else {
    return ApiError::BadRequest("cannot determine client address".to_owned()).into_response();
  };

  if !state.limiter.admit(&client).await {
    tracing::info!("daily post limit reached");
    return ApiError::TooManyRequests.into_response();
  }
  next.run(req).await
}
