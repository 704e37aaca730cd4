//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`. Event timestamps are stored as
//! RFC 3339 with a fixed microsecond precision and a `Z` suffix, so text order
//! equals time order. Enum discriminants are stored as their upper-case
//! names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reel_core::{
  entity::{Film, Review, User},
  feed::{Event, EventType, Operation},
  ids::{EventId, FilmId, ReviewId, UserId},
};
use rusqlite::{
  Row,
  types::{FromSql, FromSqlError, FromSqlResult, ValueRef},
};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enum columns ────────────────────────────────────────────────────────────

/// Reads a text column through the wrapped type's `FromStr`, for enums that
/// must be decoded inside a transaction.
pub struct Tagged<T>(pub T);

impl<T> FromSql for Tagged<T>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
    value
      .as_str()?
      .parse()
      .map(Tagged)
      .map_err(|e| FromSqlError::Other(Box::new(e)))
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "user_id, name, login, email, birthday";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:  i64,
  pub name:     String,
  pub login:    String,
  pub email:    String,
  pub birthday: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:  row.get(0)?,
      name:     row.get(1)?,
      login:    row.get(2)?,
      email:    row.get(3)?,
      birthday: row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:       UserId(self.user_id),
      name:     self.name,
      login:    self.login,
      email:    self.email,
      birthday: decode_date(&self.birthday)?,
    })
  }
}

/// Film columns joined with the like counter; matches [`RawFilm::from_row`].
pub const FILM_SELECT: &str = "
  SELECT f.film_id, f.name, f.description, f.release_date, f.duration,
         COALESCE(c.likes, 0)
  FROM films f
  LEFT JOIN film_like_counts c ON c.film_id = f.film_id";

/// Raw values read from a `films` row joined with its like counter.
pub struct RawFilm {
  pub film_id:      i64,
  pub name:         String,
  pub description:  String,
  pub release_date: String,
  pub duration:     u32,
  pub likes:        i64,
}

impl RawFilm {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      film_id:      row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      release_date: row.get(3)?,
      duration:     row.get(4)?,
      likes:        row.get(5)?,
    })
  }

  pub fn into_film(self) -> Result<Film> {
    Ok(Film {
      id:           FilmId(self.film_id),
      name:         self.name,
      description:  self.description,
      release_date: decode_date(&self.release_date)?,
      duration:     self.duration,
      likes:        u64::try_from(self.likes).unwrap_or(0),
    })
  }
}

/// Review columns joined with the usefulness score; matches [`read_review`].
pub const REVIEW_SELECT: &str = "
  SELECT r.review_id, r.content, r.is_positive, r.user_id, r.film_id,
         COALESCE(s.useful, 0)
  FROM reviews r
  LEFT JOIN review_scores s ON s.review_id = r.review_id";

pub fn read_review(row: &Row<'_>) -> rusqlite::Result<Review> {
  Ok(Review {
    id:          ReviewId(row.get(0)?),
    content:     row.get(1)?,
    is_positive: row.get(2)?,
    user_id:     UserId(row.get(3)?),
    film_id:     FilmId(row.get(4)?),
    useful:      row.get(5)?,
  })
}

/// Column list matching [`RawEvent::from_row`].
pub const EVENT_COLUMNS: &str =
  "event_id, user_id, entity_id, event_type, operation, recorded_at";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:    i64,
  pub user_id:     i64,
  pub entity_id:   i64,
  pub event_type:  EventType,
  pub operation:   Operation,
  pub recorded_at: String,
}

impl RawEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:    row.get(0)?,
      user_id:     row.get(1)?,
      entity_id:   row.get(2)?,
      event_type:  row.get::<_, Tagged<EventType>>(3)?.0,
      operation:   row.get::<_, Tagged<Operation>>(4)?.0,
      recorded_at: row.get(5)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:         EventId(self.event_id),
      user_id:    UserId(self.user_id),
      entity_id:  self.entity_id,
      event_type: self.event_type,
      operation:  self.operation,
      timestamp:  decode_dt(&self.recorded_at)?,
    })
  }
}
