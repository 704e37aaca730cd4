//! The friendship state machine.
//!
//! Friendships are directed edges `(requester, target)`. An edge starts
//! [`Pending`](FriendshipStatus::Pending); the target sending a request back
//! while that edge is still pending confirms both directions at once. Edges
//! are removed one direction at a time, so `(a, b)` and `(b, a)` may disagree.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, ids::UserId};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Display,
  AsRefStr,
  EnumString,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum FriendshipStatus {
  Pending,
  Confirmed,
}

/// One directed friendship record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipEdge {
  pub requester: UserId,
  pub target:    UserId,
  pub status:    FriendshipStatus,
}

/// What a friendship request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
  /// A new pending edge `(a, b)` was written.
  Requested,
  /// `(a, b)` was already pending; nothing changed.
  AlreadyRequested,
  /// `(b, a)` was pending, so both edges are now confirmed.
  Confirmed,
  /// `(a, b)` was already confirmed; nothing changed.
  AlreadyFriends,
}

impl RequestOutcome {
  /// Whether the request wrote anything. Only state-changing requests are
  /// recorded in the activity feed.
  pub fn changes_state(self) -> bool {
    matches!(self, Self::Requested | Self::Confirmed)
  }
}

/// Reject self-edges before touching storage.
pub fn ensure_distinct(a: UserId, b: UserId) -> Result<()> {
  if a == b {
    return Err(Error::InvalidOperation(format!(
      "user {a} cannot befriend themselves"
    )));
  }
  Ok(())
}

/// Decide what `a` requesting `b` does, given the current status of the
/// forward edge `(a, b)` and the reverse edge `(b, a)`.
///
/// A pending reverse edge always wins: it means `b` asked first, so the
/// request is a mutual upgrade even if `(a, b)` already exists.
pub fn resolve_request(
  forward: Option<FriendshipStatus>,
  reverse: Option<FriendshipStatus>,
) -> RequestOutcome {
  match (forward, reverse) {
    (_, Some(FriendshipStatus::Pending)) => RequestOutcome::Confirmed,
    (Some(FriendshipStatus::Confirmed), _) => RequestOutcome::AlreadyFriends,
    (Some(FriendshipStatus::Pending), _) => RequestOutcome::AlreadyRequested,
    (None, _) => RequestOutcome::Requested,
  }
}
