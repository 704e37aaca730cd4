//! Likes on films and votes on reviews.
//!
//! A film like is a bare `(user, film)` edge. A review vote carries a
//! polarity, and each review's usefulness score is the sum of its votes'
//! weights: `+1` for a like, `-1` for a dislike. Backends never recount;
//! they apply [`usefulness_delta`] in the same transaction as the vote edge.

use serde::{Deserialize, Serialize};

use crate::{
  feed::Operation,
  ids::{FilmId, ReviewId, UserId},
};

/// A user liking a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilmLike {
  pub user_id: UserId,
  pub film_id: FilmId,
}

/// A user's vote on a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVote {
  pub review_id: ReviewId,
  pub user_id:   UserId,
  pub is_like:   bool,
}

fn weight(vote: Option<bool>) -> i64 {
  match vote {
    Some(true) => 1,
    Some(false) => -1,
    None => 0,
  }
}

/// Change in a review's usefulness when a user's vote moves from `prior` to
/// `next` (`None` meaning no vote).
pub fn usefulness_delta(prior: Option<bool>, next: Option<bool>) -> i64 {
  weight(next) - weight(prior)
}

/// How a single user's vote on a review changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChange {
  Unchanged,
  Cast,
  Flipped,
  Cleared,
}

impl VoteChange {
  pub fn between(prior: Option<bool>, next: Option<bool>) -> Self {
    match (prior, next) {
      (None, None) => Self::Unchanged,
      (None, Some(_)) => Self::Cast,
      (Some(_), None) => Self::Cleared,
      (Some(p), Some(n)) if p == n => Self::Unchanged,
      (Some(_), Some(_)) => Self::Flipped,
    }
  }

  /// Clearing `prior`. With `only` set, a vote of the other polarity is
  /// left in place.
  pub fn clearing(prior: Option<bool>, only: Option<bool>) -> Self {
    match (prior, only) {
      (Some(p), Some(o)) if p != o => Self::Unchanged,
      _ => Self::between(prior, None),
    }
  }

  /// The feed operation recorded for this change, if any.
  pub fn operation(self) -> Option<Operation> {
    match self {
      Self::Unchanged => None,
      Self::Cast => Some(Operation::Add),
      Self::Flipped => Some(Operation::Update),
      Self::Cleared => Some(Operation::Remove),
    }
  }
}
