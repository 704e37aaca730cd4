//! [`ActivityFeed`] for [`SqliteStore`], plus the event writer every other
//! mutation shares.

use chrono::Utc;
use reel_core::{
  feed::{Event, EventType, Operation, resolve_feed_limit},
  ids::{EventId, UserId},
  store::ActivityFeed,
};
use rusqlite::Connection;

use crate::{
  Result,
  encode::{EVENT_COLUMNS, RawEvent, encode_dt},
  store::SqliteStore,
};

/// Append one event. Callers pass the open transaction of the mutation the
/// event describes.
pub(crate) fn append_event(
  conn: &Connection,
  user: UserId,
  entity_id: i64,
  event_type: EventType,
  operation: Operation,
) -> rusqlite::Result<Event> {
  let timestamp = Utc::now();
  conn.execute(
    "INSERT INTO events (user_id, entity_id, event_type, operation, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      user.0,
      entity_id,
      event_type.as_ref(),
      operation.as_ref(),
      encode_dt(timestamp),
    ],
  )?;
  Ok(Event {
    id: EventId(conn.last_insert_rowid()),
    user_id: user,
    entity_id,
    event_type,
    operation,
    timestamp,
  })
}

impl ActivityFeed for SqliteStore {
  async fn record(
    &self,
    user: UserId,
    entity_id: i64,
    event_type: EventType,
    operation: Operation,
  ) -> Result<Event> {
    let event = self
      .conn
      .call(move |conn| {
        Ok(append_event(conn, user, entity_id, event_type, operation)?)
      })
      .await?;
    Ok(event)
  }

  async fn feed_for(&self, user: UserId, limit: i64) -> Result<Vec<Event>> {
    let limit = i64::try_from(resolve_feed_limit(limit)?).unwrap_or(i64::MAX);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events
           WHERE user_id = ?1
           ORDER BY event_id ASC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user.0, limit], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}
