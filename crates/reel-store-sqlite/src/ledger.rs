//! [`EngagementLedger`] for [`SqliteStore`].
//!
//! Counters live in `film_like_counts` and `review_scores`. Each is adjusted
//! in the same transaction as the edge it summarises and is never recounted
//! from the edge tables.

use std::collections::BTreeSet;

use reel_core::{
  engagement::{FilmLike, VoteChange, usefulness_delta},
  feed::{EventType, Operation},
  ids::{FilmId, ReviewId, UserId},
  store::EngagementLedger,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};

use crate::{Result, feed::append_event, store::SqliteStore};

// ─── Shared SQL helpers ──────────────────────────────────────────────────────
//
// All of these run inside a transaction opened by the caller.

fn current_vote(
  conn: &Connection,
  review: ReviewId,
  user: UserId,
) -> rusqlite::Result<Option<bool>> {
  conn
    .query_row(
      "SELECT is_like FROM review_votes WHERE review_id = ?1 AND user_id = ?2",
      rusqlite::params![review.0, user.0],
      |row| row.get(0),
    )
    .optional()
}

fn adjust_usefulness(
  conn: &Connection,
  review: ReviewId,
  delta: i64,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO review_scores (review_id, useful) VALUES (?1, ?2)
     ON CONFLICT (review_id) DO UPDATE SET useful = useful + excluded.useful",
    rusqlite::params![review.0, delta],
  )?;
  Ok(())
}

/// Drop every like and vote cast by `user`, unwinding each from its counter.
pub(crate) fn purge_user_engagement(
  conn: &Connection,
  user: UserId,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE film_like_counts SET likes = likes - 1
     WHERE film_id IN (SELECT film_id FROM film_likes WHERE user_id = ?1)",
    rusqlite::params![user.0],
  )?;
  conn.execute(
    "DELETE FROM film_likes WHERE user_id = ?1",
    rusqlite::params![user.0],
  )?;
  conn.execute(
    "UPDATE review_scores SET useful = useful - (
       SELECT CASE WHEN v.is_like THEN 1 ELSE -1 END
       FROM review_votes v
       WHERE v.review_id = review_scores.review_id AND v.user_id = ?1
     )
     WHERE review_id IN (SELECT review_id FROM review_votes WHERE user_id = ?1)",
    rusqlite::params![user.0],
  )?;
  conn.execute(
    "DELETE FROM review_votes WHERE user_id = ?1",
    rusqlite::params![user.0],
  )?;
  Ok(())
}

pub(crate) fn purge_film_likes(conn: &Connection, film: FilmId) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM film_likes WHERE film_id = ?1",
    rusqlite::params![film.0],
  )?;
  conn.execute(
    "DELETE FROM film_like_counts WHERE film_id = ?1",
    rusqlite::params![film.0],
  )?;
  Ok(())
}

pub(crate) fn purge_review_votes(
  conn: &Connection,
  review: ReviewId,
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM review_votes WHERE review_id = ?1",
    rusqlite::params![review.0],
  )?;
  conn.execute(
    "DELETE FROM review_scores WHERE review_id = ?1",
    rusqlite::params![review.0],
  )?;
  Ok(())
}

// ─── EngagementLedger impl ───────────────────────────────────────────────────

impl EngagementLedger for SqliteStore {
  // ── Film likes ────────────────────────────────────────────────────────────

  async fn like_film(&self, user: UserId, film: FilmId) -> Result<bool> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
          "INSERT OR IGNORE INTO film_likes (film_id, user_id) VALUES (?1, ?2)",
          rusqlite::params![film.0, user.0],
        )? > 0;
        if inserted {
          tx.execute(
            "INSERT INTO film_like_counts (film_id, likes) VALUES (?1, 1)
             ON CONFLICT (film_id) DO UPDATE SET likes = likes + 1",
            rusqlite::params![film.0],
          )?;
        }
        // Recorded on every call, repeats included.
        append_event(&tx, user, film.0, EventType::Like, Operation::Add)?;
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    tracing::debug!(%user, %film, inserted, "film like");
    Ok(inserted)
  }

  async fn unlike_film(&self, user: UserId, film: FilmId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute(
          "DELETE FROM film_likes WHERE film_id = ?1 AND user_id = ?2",
          rusqlite::params![film.0, user.0],
        )? > 0;
        if removed {
          tx.execute(
            "UPDATE film_like_counts SET likes = likes - 1 WHERE film_id = ?1",
            rusqlite::params![film.0],
          )?;
          append_event(&tx, user, film.0, EventType::Like, Operation::Remove)?;
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    tracing::debug!(%user, %film, removed, "film unlike");
    Ok(removed)
  }

  async fn like_count_of(&self, film: FilmId) -> Result<u64> {
    let likes: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT likes FROM film_like_counts WHERE film_id = ?1",
              rusqlite::params![film.0],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(likes.map_or(0, |n| u64::try_from(n).unwrap_or(0)))
  }

  async fn film_like_counts(&self) -> Result<Vec<(FilmId, u64)>> {
    let counts = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT f.film_id, COALESCE(c.likes, 0)
           FROM films f
           LEFT JOIN film_like_counts c ON c.film_id = f.film_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            let likes: i64 = row.get(1)?;
            Ok((FilmId(row.get(0)?), u64::try_from(likes).unwrap_or(0)))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(counts)
  }

  async fn films_liked_by(&self, user: UserId) -> Result<BTreeSet<FilmId>> {
    let films = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT film_id FROM film_likes WHERE user_id = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![user.0], |row| {
            row.get::<_, i64>(0).map(FilmId)
          })?
          .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(films)
  }

  async fn film_likes(&self) -> Result<Vec<FilmLike>> {
    let likes = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT user_id, film_id FROM film_likes")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(FilmLike {
              user_id: UserId(row.get(0)?),
              film_id: FilmId(row.get(1)?),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(likes)
  }

  // ── Review votes ──────────────────────────────────────────────────────────

  async fn set_review_vote(
    &self,
    review: ReviewId,
    user: UserId,
    is_like: bool,
  ) -> Result<VoteChange> {
    let change = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let prior = current_vote(&tx, review, user)?;
        let change = VoteChange::between(prior, Some(is_like));
        let Some(operation) = change.operation() else {
          return Ok(change);
        };

        tx.execute(
          "INSERT INTO review_votes (review_id, user_id, is_like) VALUES (?1, ?2, ?3)
           ON CONFLICT (review_id, user_id) DO UPDATE SET is_like = excluded.is_like",
          rusqlite::params![review.0, user.0, is_like],
        )?;
        adjust_usefulness(&tx, review, usefulness_delta(prior, Some(is_like)))?;
        append_event(&tx, user, review.0, EventType::Vote, operation)?;
        tx.commit()?;
        Ok(change)
      })
      .await?;

    tracing::debug!(%review, %user, is_like, ?change, "review vote");
    Ok(change)
  }

  async fn clear_review_vote(
    &self,
    review: ReviewId,
    user: UserId,
    only: Option<bool>,
  ) -> Result<VoteChange> {
    let change = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let prior = current_vote(&tx, review, user)?;
        let change = VoteChange::clearing(prior, only);
        let Some(operation) = change.operation() else {
          return Ok(change);
        };

        tx.execute(
          "DELETE FROM review_votes WHERE review_id = ?1 AND user_id = ?2",
          rusqlite::params![review.0, user.0],
        )?;
        adjust_usefulness(&tx, review, usefulness_delta(prior, None))?;
        append_event(&tx, user, review.0, EventType::Vote, operation)?;
        tx.commit()?;
        Ok(change)
      })
      .await?;

    tracing::debug!(%review, %user, ?only, ?change, "review vote cleared");
    Ok(change)
  }

  async fn review_vote(&self, review: ReviewId, user: UserId) -> Result<Option<bool>> {
    let vote = self
      .conn
      .call(move |conn| Ok(current_vote(conn, review, user)?))
      .await?;
    Ok(vote)
  }

  async fn usefulness_of(&self, review: ReviewId) -> Result<i64> {
    let useful: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT useful FROM review_scores WHERE review_id = ?1",
              rusqlite::params![review.0],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(useful.unwrap_or(0))
  }

  async fn review_scores(&self, film: Option<FilmId>) -> Result<Vec<(ReviewId, i64)>> {
    let scores = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.review_id, COALESCE(s.useful, 0)
           FROM reviews r
           LEFT JOIN review_scores s ON s.review_id = r.review_id
           WHERE ?1 IS NULL OR r.film_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![film.map(|f| f.0)], |row| {
            Ok((ReviewId(row.get(0)?), row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(scores)
  }

  // ── Purge hooks ───────────────────────────────────────────────────────────

  async fn purge_by_user(&self, user: UserId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        purge_user_engagement(&tx, user)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    tracing::info!(%user, "purged likes and votes by user");
    Ok(())
  }

  async fn purge_by_film(&self, film: FilmId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        purge_film_likes(&tx, film)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    tracing::info!(%film, "purged likes on film");
    Ok(())
  }

  async fn purge_by_review(&self, review: ReviewId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        purge_review_votes(&tx, review)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    tracing::info!(%review, "purged votes on review");
    Ok(())
  }
}
