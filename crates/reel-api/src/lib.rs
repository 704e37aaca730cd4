//! JSON REST API for Reel.
//!
//! Exposes an axum [`Router`] over a [`reel_core::Engine`] backed by any
//! [`Store`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(reel_api::api_router(Engine::new(store.clone())))
//! ```

pub mod error;
pub mod extract;
pub mod feed;
pub mod films;
pub mod friends;
pub mod reviews;
pub mod users;

use axum::{
  Router,
  routing::{get, put},
};
use reel_core::{Engine, store::Store};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Engine<S>) -> Router<()>
where
  S: Store + 'static,
{
  Router::new()
    // Users
    .route(
      "/users",
      get(users::list::<S>)
        .post(users::create::<S>)
        .put(users::update::<S>),
    )
    .route(
      "/users/{id}",
      get(users::get_one::<S>).delete(users::delete_one::<S>),
    )
    // Friendships
    .route("/users/{id}/friends", get(friends::list::<S>))
    .route("/users/{id}/friends/pending", get(friends::pending::<S>))
    .route("/users/{id}/friends/incoming", get(friends::incoming::<S>))
    .route(
      "/users/{id}/friends/common/{other_id}",
      get(friends::common::<S>),
    )
    .route(
      "/users/{id}/friends/{friend_id}",
      put(friends::add::<S>).delete(friends::remove::<S>),
    )
    // Feed
    .route("/users/{id}/feed", get(feed::feed::<S>))
    .route("/users/{id}/recommendations", get(feed::recommendations::<S>))
    // Films
    .route(
      "/films",
      get(films::list::<S>)
        .post(films::create::<S>)
        .put(films::update::<S>),
    )
    .route("/films/popular", get(films::popular::<S>))
    .route("/films/common", get(films::common::<S>))
    .route(
      "/films/{id}",
      get(films::get_one::<S>).delete(films::delete_one::<S>),
    )
    .route(
      "/films/{id}/like/{user_id}",
      put(films::like::<S>).delete(films::unlike::<S>),
    )
    // Reviews
    .route(
      "/reviews",
      get(reviews::list::<S>)
        .post(reviews::create::<S>)
        .put(reviews::update::<S>),
    )
    .route(
      "/reviews/{id}",
      get(reviews::get_one::<S>).delete(reviews::delete_one::<S>),
    )
    .route(
      "/reviews/{id}/like/{user_id}",
      put(reviews::like::<S>).delete(reviews::remove_like::<S>),
    )
    .route(
      "/reviews/{id}/dislike/{user_id}",
      put(reviews::dislike::<S>).delete(reviews::remove_dislike::<S>),
    )
    .with_state(engine)
}

// ─── Integration tests ────────────────────────────────────────────────────────
