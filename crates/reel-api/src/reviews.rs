//! Handlers for `/reviews` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/reviews` | `?film_id=` optional, `?count=` defaults to 10; most useful first |
//! | `POST`   | `/reviews` | Body: [`NewReview`]; returns 201 + stored review |
//! | `PUT`    | `/reviews` | Body: [`ReviewUpdate`] |
//! | `GET`    | `/reviews/{id}` | 404 if not found |
//! | `DELETE` | `/reviews/{id}` | |
//! | `PUT`    | `/reviews/{id}/like/{user_id}` | Casts or flips the vote |
//! | `DELETE` | `/reviews/{id}/like/{user_id}` | Removes a like only |
//! | `PUT`    | `/reviews/{id}/dislike/{user_id}` | Casts or flips the vote |
//! | `DELETE` | `/reviews/{id}/dislike/{user_id}` | Removes a dislike only |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use reel_core::{
  Engine,
  entity::{NewReview, Review, ReviewUpdate},
  ids::{FilmId, ReviewId, UserId},
  store::Store,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{JsonBody, Path, Query},
  films::DEFAULT_COUNT,
};

fn default_count() -> i64 { DEFAULT_COUNT }

// ─── CRUD ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Restrict to reviews of this film.
  pub film_id: Option<FilmId>,
  #[serde(default = "default_count")]
  pub count:   i64,
}

/// `GET /reviews[?film_id=<id>][&count=<n>]`
pub async fn list<S: Store>(
  State(engine): State<Engine<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Review>>, ApiError> {
  let reviews = engine
    .top_reviews(params.film_id, params.count)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(reviews))
}

/// `POST /reviews`
pub async fn create<S: Store>(
  State(engine): State<Engine<S>>,
  JsonBody(body): JsonBody<NewReview>,
) -> Result<impl IntoResponse, ApiError> {
  let review = engine
    .create_review(body)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok((StatusCode::CREATED, Json(review)))
}

/// `PUT /reviews`
pub async fn update<S: Store>(
  State(engine): State<Engine<S>>,
  JsonBody(body): JsonBody<ReviewUpdate>,
) -> Result<Json<Review>, ApiError> {
  let review = engine
    .update_review(body)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(review))
}

/// `GET /reviews/{id}`
pub async fn get_one<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<ReviewId>,
) -> Result<Json<Review>, ApiError> {
  let review = engine.review(id).await.map_err(ApiError::backend::<S>)?;
  Ok(Json(review))
}

/// `DELETE /reviews/{id}`
pub async fn delete_one<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<ReviewId>,
) -> Result<StatusCode, ApiError> {
  engine.delete_review(id).await.map_err(ApiError::backend::<S>)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Votes ────────────────────────────────────────────────────────────────────

async fn vote<S: Store>(
  engine: &Engine<S>,
  id: ReviewId,
  user_id: UserId,
  is_like: bool,
) -> Result<StatusCode, ApiError> {
  engine
    .set_review_vote(id, user_id, is_like)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(StatusCode::NO_CONTENT)
}

async fn unvote<S: Store>(
  engine: &Engine<S>,
  id: ReviewId,
  user_id: UserId,
  is_like: bool,
) -> Result<StatusCode, ApiError> {
  engine
    .clear_review_vote(id, user_id, Some(is_like))
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /reviews/{id}/like/{user_id}`
pub async fn like<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, user_id)): Path<(ReviewId, UserId)>,
) -> Result<StatusCode, ApiError> {
  vote(&engine, id, user_id, true).await
}

/// `PUT /reviews/{id}/dislike/{user_id}`
pub async fn dislike<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, user_id)): Path<(ReviewId, UserId)>,
) -> Result<StatusCode, ApiError> {
  vote(&engine, id, user_id, false).await
}

/// `DELETE /reviews/{id}/like/{user_id}`
pub async fn remove_like<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, user_id)): Path<(ReviewId, UserId)>,
) -> Result<StatusCode, ApiError> {
  unvote(&engine, id, user_id, true).await
}

/// `DELETE /reviews/{id}/dislike/{user_id}`
pub async fn remove_dislike<S: Store>(
  State(engine): State<Engine<S>>,
  Path((id, user_id)): Path<(ReviewId, UserId)>,
) -> Result<StatusCode, ApiError> {
  unvote(&engine, id, user_id, false).await
}
