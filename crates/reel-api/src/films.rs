//! Handlers for `/films` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/films` | Every film with its like count |
//! | `POST`   | `/films` | Body: [`NewFilm`]; returns 201 + stored film |
//! | `PUT`    | `/films` | Body: full [`Film`]; `likes` is ignored |
//! | `GET`    | `/films/{id}` | 404 if not found |
//! | `DELETE` | `/films/{id}` | Also drops its reviews and likes |
//! | `PUT`    | `/films/{id}/like/{user_id}` | Idempotent |
//! | `DELETE` | `/films/{id}/like/{user_id}` | Idempotent |
//! | `GET`    | `/films/popular` | `?count=` defaults to 10 |
//! | `GET`    | `/films/common` | `?user_id=&friend_id=`, both required |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use reel_core::{
  Engine,
  entity::{Film, NewFilm},
  ids::{FilmId, UserId},
  store::Store,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{JsonBody, Path, Query},
};

/// Page size for ranking endpoints when `count` is omitted.
pub const DEFAULT_COUNT: i64 = 10;

fn default_count() -> i64 { DEFAULT_COUNT }

// ─── CRUD ─────────────────────────────────────────────────────────────────────

/// `GET /films`
pub async fn list<S: Store>(
  State(engine): State<Engine<S>>,
) -> Result<Json<Vec<Film>>, ApiError> {
  let films = engine.films().await.map_err(ApiError::backend::<S>)?;
  Ok(Json(films))
}

/// `POST /films`
pub async fn create<S: Store>(
  State(engine): State<Engine<S>>,
  JsonBody(body): JsonBody<NewFilm>,
) -> Result<impl IntoResponse, ApiError> {
  let film = engine
    .create_film(body)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok((StatusCode::CREATED, Json(film)))
}

/// `PUT /films`
pub async fn update<S: Store>(
  State(engine): State<Engine<S>>,
  JsonBody(body): JsonBody<Film>,
) -> Result<Json<Film>, ApiError> {
  let film = engine
    .update_film(body)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(film))
}

/// `GET /films/{id}`
pub async fn get_one<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<FilmId>,
) -> Result<Json<Film>, ApiError> {
  let film = engine.film(id).await.map_err(ApiError::backend::<S>)?;
  Ok(Json(film))
}

/// `DELETE /films/{id}`
pub async fn delete_one<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<FilmId>,
) -> Result<StatusCode, ApiError> {
  engine.delete_film(id).await.map_err(ApiError::backend::<S>)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Likes ────────────────────────────────────────────────────────────────────

/// `PUT /films/{id}/like/{user_id}`
pub async fn like<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, user_id)): Path<(FilmId, UserId)>,
) -> Result<StatusCode, ApiError> {
  engine
    .like_film(user_id, id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /films/{id}/like/{user_id}`
pub async fn unlike<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, user_id)): Path<(FilmId, UserId)>,
) -> Result<StatusCode, ApiError> {
  engine
    .unlike_film(user_id, id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Rankings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PopularParams {
  #[serde(default = "default_count")]
  pub count: i64,
}

/// `GET /films/popular[?count=<n>]`
pub async fn popular<S: Store>(
  State(engine): State<Engine<S>>,
  Query(params): Query<PopularParams>,
) -> Result<Json<Vec<Film>>, ApiError> {
  let films = engine
    .popular_films(params.count)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(films))
}

#[derive(Debug, Deserialize)]
pub struct CommonParams {
  pub user_id:   UserId,
  pub friend_id: UserId,
}

/// `GET /films/common?user_id=<id>&friend_id=<id>`
pub async fn common<S: Store>(
  State(engine): State<Engine<S>>,
  Query(params): Query<CommonParams>,
) -> Result<Json<Vec<Film>>, ApiError> {
  let films = engine
    .common_films(params.user_id, params.friend_id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(films))
}
