//! Activity feed vocabulary.
//!
//! The feed is an append-only log. Backends write one [`Event`] in the same
//! transaction as each state-changing relationship or engagement mutation,
//! and never update or delete an event afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Error, Result,
  ids::{EventId, UserId},
};

/// Number of events returned when the caller passes a limit of zero.
pub const DEFAULT_FEED_LIMIT: usize = 25;

/// What kind of relationship an event is about. The `entity_id` of the event
/// names the other side: a user for `Friend`, a film for `Like`, a review for
/// `Review` and `Vote`.
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
pub enum EventType {
  Friend,
  Like,
  Review,
  Vote,
}

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
pub enum Operation {
  Add,
  Remove,
  Update,
}

/// One immutable feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub id:         EventId,
  /// The user who acted.
  pub user_id:    UserId,
  pub entity_id:  i64,
  pub event_type: EventType,
  pub operation:  Operation,
  /// Server-assigned.
  pub timestamp:  DateTime<Utc>,
}

/// Turn a caller-supplied feed limit into a row count.
pub fn resolve_feed_limit(limit: i64) -> Result<usize> {
  match limit {
    0 => Ok(DEFAULT_FEED_LIMIT),
    n if n < 0 => Err(Error::InvalidOperation(format!(
      "feed limit must not be negative, got {n}"
    ))),
    n => Ok(usize::try_from(n).unwrap_or(usize::MAX)),
  }
}
