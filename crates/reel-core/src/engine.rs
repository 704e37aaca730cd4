//! [`Engine`]: the validating front door to a backend.
//!
//! The backend traits trust their inputs. The engine checks payload fields
//! and entity existence first, each in its own backend call, and only then
//! issues the mutation. No transaction is held across those calls.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::{
  EntityKind, Error,
  engagement::VoteChange,
  entity::{Film, NewFilm, NewReview, NewUser, Review, ReviewUpdate, User},
  feed::{Event, resolve_feed_limit},
  friendship::{RequestOutcome, ensure_distinct},
  ids::{FilmId, ReviewId, UserId},
  ranking::{PopularFilm, RankedReview, RankingEngine},
  store::{ActivityFeed, EngagementLedger, EntityStore, RelationshipGraph, Store},
  validate,
};

fn today() -> NaiveDate { Utc::now().date_naive() }

/// Validated operations over a backend implementing every store trait.
///
/// Cloning is cheap; the backend is reference-counted.
pub struct Engine<S> {
  store: Arc<S>,
}

impl<S> Clone for Engine<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: Store> Engine<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  pub fn ranking(&self) -> RankingEngine<'_, S> {
    RankingEngine::new(self.store.as_ref())
  }

  // ── Existence checks ──────────────────────────────────────────────────

  async fn require_user(&self, id: UserId) -> Result<(), S::Error> {
    if !self.store.user_exists(id).await? {
      return Err(Error::not_found(EntityKind::User, id).into());
    }
    Ok(())
  }

  async fn require_film(&self, id: FilmId) -> Result<(), S::Error> {
    if !self.store.film_exists(id).await? {
      return Err(Error::not_found(EntityKind::Film, id).into());
    }
    Ok(())
  }

  async fn require_review(&self, id: ReviewId) -> Result<(), S::Error> {
    if !self.store.review_exists(id).await? {
      return Err(Error::not_found(EntityKind::Review, id).into());
    }
    Ok(())
  }

  // ── Users ─────────────────────────────────────────────────────────────

  pub async fn create_user(&self, mut input: NewUser) -> Result<User, S::Error> {
    validate::check_user(&input, today())?;
    input.name = Some(validate::display_name(input.name.as_deref(), &input.login));
    self.store.add_user(input).await
  }

  pub async fn update_user(&self, user: User) -> Result<User, S::Error> {
    let fields = NewUser {
      name:     Some(user.name.clone()),
      login:    user.login.clone(),
      email:    user.email.clone(),
      birthday: user.birthday,
    };
    validate::check_user(&fields, today())?;
    let name = validate::display_name(Some(&user.name), &user.login);
    self.store.update_user(User { name, ..user }).await
  }

  pub async fn user(&self, id: UserId) -> Result<User, S::Error> {
    self
      .store
      .get_user(id)
      .await?
      .ok_or_else(|| Error::not_found(EntityKind::User, id).into())
  }

  pub async fn users(&self) -> Result<Vec<User>, S::Error> {
    self.store.list_users().await
  }

  pub async fn delete_user(&self, id: UserId) -> Result<(), S::Error> {
    if !self.store.delete_user(id).await? {
      return Err(Error::not_found(EntityKind::User, id).into());
    }
    Ok(())
  }

  // ── Films ─────────────────────────────────────────────────────────────

  pub async fn create_film(&self, input: NewFilm) -> Result<Film, S::Error> {
    validate::check_film(&input)?;
    self.store.add_film(input).await
  }

  pub async fn update_film(&self, film: Film) -> Result<Film, S::Error> {
    validate::check_film(&NewFilm {
      name:         film.name.clone(),
      description:  film.description.clone(),
      release_date: film.release_date,
      duration:     film.duration,
    })?;
    self.store.update_film(film).await
  }

  pub async fn film(&self, id: FilmId) -> Result<Film, S::Error> {
    self
      .store
      .get_film(id)
      .await?
      .ok_or_else(|| Error::not_found(EntityKind::Film, id).into())
  }

  pub async fn films(&self) -> Result<Vec<Film>, S::Error> {
    self.store.list_films().await
  }

  pub async fn delete_film(&self, id: FilmId) -> Result<(), S::Error> {
    if !self.store.delete_film(id).await? {
      return Err(Error::not_found(EntityKind::Film, id).into());
    }
    Ok(())
  }

  // ── Reviews ───────────────────────────────────────────────────────────

  pub async fn create_review(&self, input: NewReview) -> Result<Review, S::Error> {
    validate::check_review(&input)?;
    self.require_user(input.user_id).await?;
    self.require_film(input.film_id).await?;
    self.store.add_review(input).await
  }

  pub async fn update_review(
    &self,
    update: ReviewUpdate,
  ) -> Result<Review, S::Error> {
    validate::check_review_content(&update.content)?;
    self.store.update_review(update).await
  }

  pub async fn review(&self, id: ReviewId) -> Result<Review, S::Error> {
    self
      .store
      .get_review(id)
      .await?
      .ok_or_else(|| Error::not_found(EntityKind::Review, id).into())
  }

  pub async fn delete_review(&self, id: ReviewId) -> Result<(), S::Error> {
    if !self.store.delete_review(id).await? {
      return Err(Error::not_found(EntityKind::Review, id).into());
    }
    Ok(())
  }

  // ── Friendships ───────────────────────────────────────────────────────

  pub async fn request_friendship(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<RequestOutcome, S::Error> {
    ensure_distinct(a, b)?;
    self.require_user(a).await?;
    self.require_user(b).await?;
    self.store.request_friendship(a, b).await
  }

  pub async fn remove_friendship(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<bool, S::Error> {
    self.require_user(a).await?;
    self.require_user(b).await?;
    self.store.remove_friendship(a, b).await
  }

  pub async fn friends_of(&self, a: UserId) -> Result<Vec<User>, S::Error> {
    self.require_user(a).await?;
    let ids = self.store.friends_of(a).await?;
    self.store.users_by_ids(ids).await
  }

  pub async fn pending_requests_of(
    &self,
    a: UserId,
  ) -> Result<Vec<User>, S::Error> {
    self.require_user(a).await?;
    let ids = self.store.pending_requests_of(a).await?;
    self.store.users_by_ids(ids).await
  }

  pub async fn incoming_requests_of(
    &self,
    a: UserId,
  ) -> Result<Vec<User>, S::Error> {
    self.require_user(a).await?;
    let ids = self.store.incoming_requests_of(a).await?;
    self.store.users_by_ids(ids).await
  }

  pub async fn common_friends(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Vec<User>, S::Error> {
    self.require_user(a).await?;
    self.require_user(b).await?;
    let ids = self.store.common_friends(a, b).await?;
    self.store.users_by_ids(ids).await
  }

  // ── Likes and votes ───────────────────────────────────────────────────

  pub async fn like_film(&self, user: UserId, film: FilmId) -> Result<bool, S::Error> {
    self.require_user(user).await?;
    self.require_film(film).await?;
    self.store.like_film(user, film).await
  }

  pub async fn unlike_film(
    &self,
    user: UserId,
    film: FilmId,
  ) -> Result<bool, S::Error> {
    self.require_user(user).await?;
    self.require_film(film).await?;
    self.store.unlike_film(user, film).await
  }

  pub async fn like_count_of(&self, film: FilmId) -> Result<u64, S::Error> {
    self.require_film(film).await?;
    self.store.like_count_of(film).await
  }

  pub async fn set_review_vote(
    &self,
    review: ReviewId,
    user: UserId,
    is_like: bool,
  ) -> Result<VoteChange, S::Error> {
    self.require_review(review).await?;
    self.require_user(user).await?;
    self.store.set_review_vote(review, user, is_like).await
  }

  /// Remove `user`'s vote on `review`. With `only` set, the vote is removed
  /// only if it has that polarity.
  pub async fn clear_review_vote(
    &self,
    review: ReviewId,
    user: UserId,
    only: Option<bool>,
  ) -> Result<VoteChange, S::Error> {
    self.require_review(review).await?;
    self.require_user(user).await?;
    self.store.clear_review_vote(review, user, only).await
  }

  pub async fn usefulness_of(&self, review: ReviewId) -> Result<i64, S::Error> {
    self.require_review(review).await?;
    self.store.usefulness_of(review).await
  }

  // ── Rankings ──────────────────────────────────────────────────────────

  async fn hydrate_films(
    &self,
    ranked: Vec<PopularFilm>,
  ) -> Result<Vec<Film>, S::Error> {
    let ids = ranked.into_iter().map(|p| p.film_id).collect();
    self.store.films_by_ids(ids).await
  }

  async fn hydrate_reviews(
    &self,
    ranked: Vec<RankedReview>,
  ) -> Result<Vec<Review>, S::Error> {
    let ids = ranked.into_iter().map(|r| r.review_id).collect();
    self.store.reviews_by_ids(ids).await
  }

  pub async fn popular_films(&self, limit: i64) -> Result<Vec<Film>, S::Error> {
    let ranked = self.ranking().popular_films(limit).await?;
    self.hydrate_films(ranked).await
  }

  /// Reviews of `film` (or of every film) by usefulness.
  pub async fn top_reviews(
    &self,
    film: Option<FilmId>,
    limit: i64,
  ) -> Result<Vec<Review>, S::Error> {
    let ranked = match film {
      Some(film) => {
        self.require_film(film).await?;
        self.ranking().top_reviews(film, limit).await?
      }
      None => self.ranking().top_reviews_overall(limit).await?,
    };
    self.hydrate_reviews(ranked).await
  }

  pub async fn common_films(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Vec<Film>, S::Error> {
    self.require_user(a).await?;
    self.require_user(b).await?;
    let ranked = self.ranking().common_films(a, b).await?;
    self.hydrate_films(ranked).await
  }

  pub async fn recommendations(&self, user: UserId) -> Result<Vec<Film>, S::Error> {
    self.require_user(user).await?;
    let ranked = self.ranking().recommend_films(user).await?;
    self.hydrate_films(ranked).await
  }

  // ── Feed ──────────────────────────────────────────────────────────────

  pub async fn feed_for(&self, user: UserId, limit: i64) -> Result<Vec<Event>, S::Error> {
    resolve_feed_limit(limit)?;
    self.require_user(user).await?;
    self.store.feed_for(user, limit).await
  }
}
