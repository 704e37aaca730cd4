//! Per-user read endpoints: the activity feed and film recommendations.

use axum::{Json, extract::State};
use reel_core::{
  Engine,
  entity::Film,
  feed::Event,
  ids::UserId,
  store::Store,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{Path, Query},
};

#[derive(Debug, Deserialize)]
pub struct FeedParams {
  /// Maximum number of events. Missing or `0` means the default page size;
  /// negative values are rejected.
  #[serde(default)]
  pub limit: i64,
}

/// `GET /users/{id}/feed[?limit=<n>]`: oldest event first.
pub async fn feed<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<UserId>,
  Query(params): Query<FeedParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let events = engine
    .feed_for(id, params.limit)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(events))
}

/// `GET /users/{id}/recommendations`
pub async fn recommendations<S: Store>(
  State(engine): State<Engine<S>>,
  Path(id): Path<UserId>,
) -> Result<Json<Vec<Film>>, ApiError> {
  let films = engine
    .recommendations(id)
    .await
    .map_err(ApiError::backend::<S>)?;
  Ok(Json(films))
}
