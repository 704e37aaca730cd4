//! Handlers for `/users/{id}/friends` endpoints.
//!
//! Friendships are directed: `PUT` sends (or reciprocates) a request from
//! `id` to `friend_id`, `DELETE` drops only the `id → friend_id` edge.

use axum::{Json, extract::State, http::StatusCode};
use reel_core::{
  Engine, entity::User, friendship::RequestOutcome, ids::UserId, store::Store,
};

use crate::{error::ApiError, extract::Path};

/// `PUT /users/{id}/friends/{friend_id}`
pub async fn add<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, friend_id)): Path<(UserId, UserId)>,
) -> Result<Json<RequestOutcome>, ApiError> {
  let outcome = engine
    .request_friendship(id, friend_id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(outcome))
}

/// `DELETE /users/{id}/friends/{friend_id}`: succeeds whether or not the
/// edge existed.
pub async fn remove<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, friend_id)): Path<(UserId, UserId)>,
) -> Result<StatusCode, ApiError> {
  engine
    .remove_friendship(id, friend_id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{id}/friends`: confirmed friends only.
pub async fn list<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<UserId>,
) -> Result<Json<Vec<User>>, ApiError> {
  let friends = engine.friends_of(id).await.map_err(ApiError::backend::<S>)?;
  Ok(Json(friends))
}

/// `GET /users/{id}/friends/pending`: outgoing requests still awaiting a
/// reply.
pub async fn pending<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<UserId>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = engine
    .pending_requests_of(id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(users))
}

/// `GET /users/{id}/friends/incoming`
pub async fn incoming<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<UserId>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = engine
    .incoming_requests_of(id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(users))
}

/// `GET /users/{id}/friends/common/{other_id}`
pub async fn common<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, other_id)): Path<(UserId, UserId)>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = engine
    .common_friends(id, other_id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(users))
}
