//! [`SqliteStore`]: the SQLite implementation of the Reel backend traits.
//!
//! This file holds the connection handling and the [`EntityStore`] impl. The
//! relationship graph, engagement ledger and activity feed live in sibling
//! modules.

use std::path::Path;

use reel_core::{
  EntityKind,
  entity::{Film, NewFilm, NewReview, NewUser, Review, ReviewUpdate, User},
  feed::{EventType, Operation},
  ids::{FilmId, ReviewId, UserId},
  store::{Backend, EntityStore},
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};

use crate::{
  Error, Result,
  encode::{
    FILM_SELECT, RawFilm, RawUser, REVIEW_SELECT, USER_COLUMNS, encode_date,
    read_review,
  },
  error::is_unique_violation,
  feed::append_event,
  graph::purge_friendships,
  ledger::{purge_film_likes, purge_review_votes, purge_user_engagement},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Reel store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::info!("schema initialised");
    Ok(())
  }

  async fn row_exists(&self, sql: &'static str, id: i64) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![id], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(exists)
  }
}

/// Delete one review and its votes inside the caller's transaction. Returns
/// the author, or `None` if the review did not exist.
fn delete_review_row(
  conn: &Connection,
  review: ReviewId,
) -> rusqlite::Result<Option<UserId>> {
  let author: Option<i64> = conn
    .query_row(
      "SELECT user_id FROM reviews WHERE review_id = ?1",
      rusqlite::params![review.0],
      |row| row.get(0),
    )
    .optional()?;
  if author.is_some() {
    purge_review_votes(conn, review)?;
    conn.execute(
      "DELETE FROM reviews WHERE review_id = ?1",
      rusqlite::params![review.0],
    )?;
  }
  Ok(author.map(UserId))
}

/// Review ids matching `column = id`, for cascading deletes.
fn review_ids_where(
  conn: &Connection,
  column: &str,
  id: i64,
) -> rusqlite::Result<Vec<ReviewId>> {
  let mut stmt =
    conn.prepare(&format!("SELECT review_id FROM reviews WHERE {column} = ?1"))?;
  let ids = stmt
    .query_map(rusqlite::params![id], |row| row.get::<_, i64>(0).map(ReviewId))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(ids)
}

fn map_unique(err: tokio_rusqlite::Error) -> Error {
  if is_unique_violation(&err) {
    reel_core::Error::InvalidOperation("login or email is already in use".into())
      .into()
  } else {
    Error::Database(err)
  }
}

// ─── Backend impl ────────────────────────────────────────────────────────────

impl Backend for SqliteStore {
  type Error = Error;

  fn domain_error(err: &Error) -> Option<&reel_core::Error> {
    match err {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl EntityStore for SqliteStore {
  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let name = input.name.unwrap_or_else(|| input.login.clone());
    let birthday = encode_date(input.birthday);
    let (login, email) = (input.login.clone(), input.email.clone());
    let name_col = name.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (name, login, email, birthday) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name_col, login, email, birthday],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(map_unique)?;

    tracing::debug!(user = id, "user added");
    Ok(User {
      id: UserId(id),
      name,
      login: input.login,
      email: input.email,
      birthday: input.birthday,
    })
  }

  async fn update_user(&self, user: User) -> Result<User> {
    let id = user.id;
    let name = user.name.clone();
    let login = user.login.clone();
    let email = user.email.clone();
    let birthday = encode_date(user.birthday);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET name = ?2, login = ?3, email = ?4, birthday = ?5
           WHERE user_id = ?1",
          rusqlite::params![id.0, name, login, email, birthday],
        )?)
      })
      .await
      .map_err(map_unique)?;

    if updated == 0 {
      return Err(reel_core::Error::not_found(EntityKind::User, id).into());
    }
    Ok(user)
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id.0],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id"))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn users_by_ids(&self, ids: Vec<UserId>) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"))?;
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
          if let Some(raw) = stmt
            .query_row(rusqlite::params![id.0], RawUser::from_row)
            .optional()?
          {
            rows.push(raw);
          }
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn delete_user(&self, id: UserId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for review in review_ids_where(&tx, "user_id", id.0)? {
          delete_review_row(&tx, review)?;
        }
        purge_user_engagement(&tx, id)?;
        purge_friendships(&tx, id)?;
        let deleted = tx.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![id.0],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
      })
      .await?;

    if deleted {
      tracing::info!(user = %id, "user deleted");
    }
    Ok(deleted)
  }

  async fn user_exists(&self, id: UserId) -> Result<bool> {
    self
      .row_exists("SELECT 1 FROM users WHERE user_id = ?1", id.0)
      .await
  }

  // ── Films ─────────────────────────────────────────────────────────────────

  async fn add_film(&self, input: NewFilm) -> Result<Film> {
    let name = input.name.clone();
    let description = input.description.clone();
    let release_date = encode_date(input.release_date);
    let duration = input.duration;

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO films (name, description, release_date, duration)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name, description, release_date, duration],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    tracing::debug!(film = id, "film added");
    Ok(Film {
      id:           FilmId(id),
      name:         input.name,
      description:  input.description,
      release_date: input.release_date,
      duration:     input.duration,
      likes:        0,
    })
  }

  async fn update_film(&self, film: Film) -> Result<Film> {
    let id = film.id;
    let name = film.name.clone();
    let description = film.description.clone();
    let release_date = encode_date(film.release_date);
    let duration = film.duration;

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE films SET name = ?2, description = ?3, release_date = ?4, duration = ?5
           WHERE film_id = ?1",
          rusqlite::params![id.0, name, description, release_date, duration],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(reel_core::Error::not_found(EntityKind::Film, id).into());
    }
    self
      .get_film(id)
      .await?
      .ok_or_else(|| reel_core::Error::not_found(EntityKind::Film, id).into())
  }

  async fn get_film(&self, id: FilmId) -> Result<Option<Film>> {
    let raw: Option<RawFilm> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{FILM_SELECT} WHERE f.film_id = ?1"),
              rusqlite::params![id.0],
              RawFilm::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFilm::into_film).transpose()
  }

  async fn list_films(&self) -> Result<Vec<Film>> {
    let raws: Vec<RawFilm> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{FILM_SELECT} ORDER BY f.film_id"))?;
        let rows = stmt
          .query_map([], RawFilm::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFilm::into_film).collect()
  }

  async fn films_by_ids(&self, ids: Vec<FilmId>) -> Result<Vec<Film>> {
    let raws: Vec<RawFilm> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("{FILM_SELECT} WHERE f.film_id = ?1"))?;
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
          if let Some(raw) = stmt
            .query_row(rusqlite::params![id.0], RawFilm::from_row)
            .optional()?
          {
            rows.push(raw);
          }
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFilm::into_film).collect()
  }

  async fn delete_film(&self, id: FilmId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for review in review_ids_where(&tx, "film_id", id.0)? {
          delete_review_row(&tx, review)?;
        }
        purge_film_likes(&tx, id)?;
        let deleted = tx.execute(
          "DELETE FROM films WHERE film_id = ?1",
          rusqlite::params![id.0],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
      })
      .await?;

    if deleted {
      tracing::info!(film = %id, "film deleted");
    }
    Ok(deleted)
  }

  async fn film_exists(&self, id: FilmId) -> Result<bool> {
    self
      .row_exists("SELECT 1 FROM films WHERE film_id = ?1", id.0)
      .await
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn add_review(&self, input: NewReview) -> Result<Review> {
    let content = input.content.clone();
    let (is_positive, user, film) = (input.is_positive, input.user_id, input.film_id);

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO reviews (content, is_positive, user_id, film_id)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![content, is_positive, user.0, film.0],
        )?;
        let id = tx.last_insert_rowid();
        append_event(&tx, user, id, EventType::Review, Operation::Add)?;
        tx.commit()?;
        Ok(id)
      })
      .await?;

    tracing::debug!(review = id, %user, %film, "review added");
    Ok(Review {
      id:          ReviewId(id),
      content:     input.content,
      is_positive: input.is_positive,
      user_id:     user,
      film_id:     film,
      useful:      0,
    })
  }

  async fn update_review(&self, update: ReviewUpdate) -> Result<Review> {
    let id = update.id;

    let review = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let updated = tx.execute(
          "UPDATE reviews SET content = ?2, is_positive = ?3 WHERE review_id = ?1",
          rusqlite::params![id.0, update.content, update.is_positive],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        let review = tx.query_row(
          &format!("{REVIEW_SELECT} WHERE r.review_id = ?1"),
          rusqlite::params![id.0],
          read_review,
        )?;
        append_event(&tx, review.user_id, id.0, EventType::Review, Operation::Update)?;
        tx.commit()?;
        Ok(Some(review))
      })
      .await?;

    review.ok_or_else(|| reel_core::Error::not_found(EntityKind::Review, id).into())
  }

  async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
    let review = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{REVIEW_SELECT} WHERE r.review_id = ?1"),
              rusqlite::params![id.0],
              read_review,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(review)
  }

  async fn reviews_by_ids(&self, ids: Vec<ReviewId>) -> Result<Vec<Review>> {
    let reviews = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("{REVIEW_SELECT} WHERE r.review_id = ?1"))?;
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
          if let Some(review) =
            stmt.query_row(rusqlite::params![id.0], read_review).optional()?
          {
            rows.push(review);
          }
        }
        Ok(rows)
      })
      .await?;
    Ok(reviews)
  }

  async fn delete_review(&self, id: ReviewId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(author) = delete_review_row(&tx, id)? else {
          return Ok(false);
        };
        append_event(&tx, author, id.0, EventType::Review, Operation::Remove)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if deleted {
      tracing::debug!(review = %id, "review deleted");
    }
    Ok(deleted)
  }

  async fn review_exists(&self, id: ReviewId) -> Result<bool> {
    self
      .row_exists("SELECT 1 FROM reviews WHERE review_id = ?1", id.0)
      .await
  }
}
