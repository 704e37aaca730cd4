//! Store-assigned identifiers.
//!
//! Every identifier is a positive integer handed out in ascending order by the
//! backend. Ranking tie-breaks rely on that ordering, so the newtypes derive
//! `Ord`.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
      Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl From<i64> for $name {
      fn from(raw: i64) -> Self { Self(raw) }
    }

    impl From<$name> for i64 {
      fn from(id: $name) -> Self { id.0 }
    }
  };
}

entity_id!(
  /// Identifies a [`User`](crate::entity::User).
  UserId
);
entity_id!(
  /// Identifies a [`Film`](crate::entity::Film).
  FilmId
);
entity_id!(
  /// Identifies a [`Review`](crate::entity::Review).
  ReviewId
);
entity_id!(
  /// Identifies an [`Event`](crate::feed::Event) in the activity feed.
  EventId
);
