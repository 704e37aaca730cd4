//! Error types for `reel-core`.

use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// The kind of record a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  User,
  Film,
  Review,
}

#[derive(Debug, Error)]
pub enum Error {
  /// The caller asked for something the domain forbids, e.g. befriending
  /// oneself or a negative feed limit.
  #[error("invalid operation: {0}")]
  InvalidOperation(String),

  #[error("{kind} not found: {id}")]
  NotFound { kind: EntityKind, id: i64 },

  /// An entity payload failed field validation.
  #[error("validation failed: {0}")]
  Validation(String),
}

impl Error {
  pub fn not_found(kind: EntityKind, id: impl Into<i64>) -> Self {
    Self::NotFound { kind, id: id.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
