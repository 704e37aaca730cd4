//! Catalog entities: users, films and reviews.
//!
//! These are the records owned by the entity store. Relationship state
//! (friendships, likes, votes) is never stored on them; the two derived
//! counters, [`Film::likes`] and [`Review::useful`], are read from the
//! engagement ledger whenever an entity is loaded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{FilmId, ReviewId, UserId};

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:       UserId,
  pub name:     String,
  /// Unique, non-empty, free of whitespace.
  pub login:    String,
  /// Unique.
  pub email:    String,
  pub birthday: NaiveDate,
}

/// Input to [`EntityStore::add_user`](crate::store::EntityStore::add_user).
/// The identifier is always assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  /// Display name; a blank or missing name falls back to the login.
  #[serde(default)]
  pub name:     Option<String>,
  pub login:    String,
  pub email:    String,
  pub birthday: NaiveDate,
}

// ─── Films ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
  pub id:           FilmId,
  pub name:         String,
  pub description:  String,
  pub release_date: NaiveDate,
  /// Running time in minutes.
  pub duration:     u32,
  /// Number of users who like this film, read from the ledger counter.
  #[serde(default)]
  pub likes:        u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFilm {
  pub name:         String,
  #[serde(default)]
  pub description:  String,
  pub release_date: NaiveDate,
  pub duration:     u32,
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub id:          ReviewId,
  pub content:     String,
  pub is_positive: bool,
  /// Author.
  pub user_id:     UserId,
  /// Subject.
  pub film_id:     FilmId,
  /// Likes minus dislikes from other users' votes on this review.
  #[serde(default)]
  pub useful:      i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
  pub content:     String,
  pub is_positive: bool,
  pub user_id:     UserId,
  pub film_id:     FilmId,
}

/// An edit to an existing review. Author and film are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewUpdate {
  pub id:          ReviewId,
  pub content:     String,
  pub is_positive: bool,
}
