//! Handlers for `/users` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users` | Every user, ascending id |
//! | `POST`   | `/users` | Body: [`NewUser`]; returns 201 + stored user |
//! | `PUT`    | `/users` | Body: full [`User`]; 404 if the id is unknown |
//! | `GET`    | `/users/{id}` | 404 if not found |
//! | `DELETE` | `/users/{id}` | Also drops the user's reviews, likes, votes and friendships |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use reel_core::{
  Engine,
  entity::{NewUser, User},
  ids::UserId,
  store::Store,
};

use crate::{
  error::ApiError,
  extract::{JsonBody, Path},
};

/// `GET /users`
pub async fn list<S: Store>(
  State(engine): State<Engine<S>>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = engine.users().await.map_err(ApiError::backend::<S>)?;
  Ok(Json(users))
}

/// `POST /users`
pub async fn create<S: Store>(
  State(engine): State<Engine<S>>,
  JsonBody(body): JsonBody<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
  let user = engine
    .create_user(body)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /users`
pub async fn update<S: Store>(
  State(engine): State<Engine<S>>,
  JsonBody(body): JsonBody<User>,
) -> Result<Json<User>, ApiError> {
  let user = engine
    .update_user(body)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(user))
}

/// `GET /users/{id}`
pub async fn get_one<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
  let user = engine.user(id).await.map_err(ApiError::backend::<S>)?;
  Ok(Json(user))
}

/// `DELETE /users/{id}`
pub async fn delete_one<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
  engine.delete_user(id).await.map_err(ApiError::backend::<S>)?;
  Ok(StatusCode::NO_CONTENT)
}
