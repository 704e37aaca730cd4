//! [`RelationshipGraph`] for [`SqliteStore`].

use reel_core::{
  feed::{EventType, Operation},
  friendship::{FriendshipStatus, RequestOutcome, ensure_distinct, resolve_request},
  ids::UserId,
  store::RelationshipGraph,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};

use crate::{Result, encode::Tagged, feed::append_event, store::SqliteStore};

fn edge_status(
  conn: &Connection,
  a: UserId,
  b: UserId,
) -> rusqlite::Result<Option<FriendshipStatus>> {
  conn
    .query_row(
      "SELECT status FROM friendships WHERE requester_id = ?1 AND target_id = ?2",
      rusqlite::params![a.0, b.0],
      |row| row.get::<_, Tagged<FriendshipStatus>>(0),
    )
    .optional()
    .map(|s| s.map(|t| t.0))
}

/// Remove every edge touching `user`. Runs inside the caller's transaction.
pub(crate) fn purge_friendships(
  conn: &Connection,
  user: UserId,
) -> rusqlite::Result<usize> {
  conn.execute(
    "DELETE FROM friendships WHERE requester_id = ?1 OR target_id = ?1",
    rusqlite::params![user.0],
  )
}

impl SqliteStore {
  /// Targets of `a`'s edges in `status`, ascending id.
  async fn targets_with_status(
    &self,
    a: UserId,
    status: FriendshipStatus,
  ) -> Result<Vec<UserId>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT target_id FROM friendships
           WHERE requester_id = ?1 AND status = ?2
           ORDER BY target_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![a.0, status.as_ref()], |row| {
            row.get::<_, i64>(0).map(UserId)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }
}

impl RelationshipGraph for SqliteStore {
  async fn request_friendship(&self, a: UserId, b: UserId) -> Result<RequestOutcome> {
    ensure_distinct(a, b)?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let forward = edge_status(&tx, a, b)?;
        let reverse = edge_status(&tx, b, a)?;
        let outcome = resolve_request(forward, reverse);

        match outcome {
          RequestOutcome::Requested => {
            tx.execute(
              "INSERT INTO friendships (requester_id, target_id, status)
               VALUES (?1, ?2, ?3)",
              rusqlite::params![a.0, b.0, FriendshipStatus::Pending.as_ref()],
            )?;
          }
          RequestOutcome::Confirmed => {
            let confirmed = FriendshipStatus::Confirmed.as_ref();
            tx.execute(
              "INSERT INTO friendships (requester_id, target_id, status)
               VALUES (?1, ?2, ?3)
               ON CONFLICT (requester_id, target_id) DO UPDATE SET status = excluded.status",
              rusqlite::params![a.0, b.0, confirmed],
            )?;
            tx.execute(
              "UPDATE friendships SET status = ?3
               WHERE requester_id = ?1 AND target_id = ?2",
              rusqlite::params![b.0, a.0, confirmed],
            )?;
          }
          RequestOutcome::AlreadyRequested | RequestOutcome::AlreadyFriends => {}
        }

        if outcome.changes_state() {
          append_event(&tx, a, b.0, EventType::Friend, Operation::Add)?;
        }
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    tracing::debug!(requester = %a, target = %b, ?outcome, "friendship request");
    Ok(outcome)
  }

  async fn remove_friendship(&self, a: UserId, b: UserId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let deleted = tx.execute(
          "DELETE FROM friendships WHERE requester_id = ?1 AND target_id = ?2",
          rusqlite::params![a.0, b.0],
        )?;
        if deleted > 0 {
          append_event(&tx, a, b.0, EventType::Friend, Operation::Remove)?;
        }
        tx.commit()?;
        Ok(deleted > 0)
      })
      .await?;

    tracing::debug!(requester = %a, target = %b, removed, "friendship removal");
    Ok(removed)
  }

  async fn friends_of(&self, a: UserId) -> Result<Vec<UserId>> {
    self.targets_with_status(a, FriendshipStatus::Confirmed).await
  }

  async fn pending_requests_of(&self, a: UserId) -> Result<Vec<UserId>> {
    self.targets_with_status(a, FriendshipStatus::Pending).await
  }

  async fn incoming_requests_of(&self, a: UserId) -> Result<Vec<UserId>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT requester_id FROM friendships
           WHERE target_id = ?1 AND status = ?2
           ORDER BY requester_id",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![a.0, FriendshipStatus::Pending.as_ref()],
            |row| row.get::<_, i64>(0).map(UserId),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  async fn common_friends(&self, a: UserId, b: UserId) -> Result<Vec<UserId>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT fa.target_id
           FROM friendships fa
           JOIN friendships fb ON fb.target_id = fa.target_id
           WHERE fa.requester_id = ?1 AND fa.status = ?3
             AND fb.requester_id = ?2 AND fb.status = ?3
           ORDER BY fa.target_id",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![a.0, b.0, FriendshipStatus::Confirmed.as_ref()],
            |row| row.get::<_, i64>(0).map(UserId),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  async fn friendship_status(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Option<FriendshipStatus>> {
    let status = self
      .conn
      .call(move |conn| Ok(edge_status(conn, a, b)?))
      .await?;
    Ok(status)
  }

  async fn purge_user_friendships(&self, user: UserId) -> Result<u64> {
    let removed = self
      .conn
      .call(move |conn| Ok(purge_friendships(conn, user)?))
      .await?;
    tracing::info!(%user, removed, "purged friendships");
    Ok(removed as u64)
  }
}
