//! Extractors that report malformed requests as [`ApiError::BadRequest`],
//! so every failure carries the same `{"error": ...}` body.
//!
//! Use these in place of axum's `Json`, `Path` and `Query` when extracting.
//! Responses still use [`axum::Json`].

use axum::{
  extract::{
    FromRequest, FromRequestParts, Request,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// A JSON request body.
pub struct JsonBody<T>(pub T);

/// Typed path parameters.
pub struct Path<T>(pub T);

/// Typed query-string parameters.
pub struct Query<T>(pub T);

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
    Ok(Self(value))
  }
}

impl<T, S> FromRequestParts<S> for Path<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    let axum::extract::Path(value) =
      axum::extract::Path::<T>::from_request_parts(parts, state).await?;
    Ok(Self(value))
  }
}

impl<T, S> FromRequestParts<S> for Query<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    let axum::extract::Query(value) =
      axum::extract::Query::<T>::from_request_parts(parts, state).await?;
    Ok(Self(value))
  }
}
