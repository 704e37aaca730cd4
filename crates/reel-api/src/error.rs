//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use reel_core::store::Backend;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error: domain errors become 404 or 400, everything
  /// else is a storage failure.
  pub fn backend<S: Backend>(err: S::Error) -> Self {
    let domain = S::domain_error(&err).map(|core| match core {
      reel_core::Error::NotFound { .. } => ApiError::NotFound(core.to_string()),
      reel_core::Error::InvalidOperation(_) | reel_core::Error::Validation(_) => {
        ApiError::BadRequest(core.to_string())
      }
    });
    domain.unwrap_or_else(|| ApiError::Store(Box::new(err)))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed in the store");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
