//! Backend traits.
//!
//! A backend implements all of these traits once against its storage. Higher
//! layers (`reel-api`, the [`Engine`](crate::Engine)) depend on these
//! abstractions, not on any concrete backend.
//!
//! The relationship, engagement and feed traits assume identifiers are valid;
//! existence checks belong to the caller (see [`Engine`](crate::Engine)).
//! Every mutating method is all-or-nothing: the edge, any counter it touches
//! and the feed event it emits commit together.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{collections::BTreeSet, future::Future};

use crate::{
  engagement::{FilmLike, VoteChange},
  entity::{Film, NewFilm, NewReview, NewUser, Review, ReviewUpdate, User},
  feed::{Event, EventType, Operation},
  friendship::{FriendshipStatus, RequestOutcome},
  ids::{FilmId, ReviewId, UserId},
};

// ─── Backend ─────────────────────────────────────────────────────────────────

/// The error type shared by every trait a backend implements.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// Recover the domain error carried inside a backend error, if that is what
  /// it is. Outer layers use this to tell caller mistakes from storage
  /// failures.
  fn domain_error(err: &Self::Error) -> Option<&crate::Error>;
}

// ─── Entity store ────────────────────────────────────────────────────────────

/// Durable access to users, films and reviews.
///
/// Deleting an entity purges every relationship edge that references it in
/// the same transaction.
pub trait EntityStore: Backend {
  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a validated user. Fails with `InvalidOperation` if the login or
  /// email is already taken.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Replace every field of an existing user. Fails with `NotFound` if the
  /// id is unknown.
  fn update_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// All users, ascending id.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// The users named by `ids`, in the order given. Unknown ids are skipped.
  fn users_by_ids(
    &self,
    ids: Vec<UserId>,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Delete a user together with their reviews, friendships, likes and
  /// votes. Returns `false` if the user did not exist.
  fn delete_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn user_exists(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Films ─────────────────────────────────────────────────────────────

  fn add_film(
    &self,
    input: NewFilm,
  ) -> impl Future<Output = Result<Film, Self::Error>> + Send + '_;

  /// Replace the descriptive fields of an existing film. `likes` is ignored.
  fn update_film(
    &self,
    film: Film,
  ) -> impl Future<Output = Result<Film, Self::Error>> + Send + '_;

  fn get_film(
    &self,
    id: FilmId,
  ) -> impl Future<Output = Result<Option<Film>, Self::Error>> + Send + '_;

  fn list_films(
    &self,
  ) -> impl Future<Output = Result<Vec<Film>, Self::Error>> + Send + '_;

  /// The films named by `ids`, in the order given. Unknown ids are skipped.
  fn films_by_ids(
    &self,
    ids: Vec<FilmId>,
  ) -> impl Future<Output = Result<Vec<Film>, Self::Error>> + Send + '_;

  /// Delete a film together with its likes and its reviews.
  fn delete_film(
    &self,
    id: FilmId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn film_exists(
    &self,
    id: FilmId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  /// Persist a review and record `REVIEW/ADD` for its author.
  fn add_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Edit content and polarity, recording `REVIEW/UPDATE` for the author.
  fn update_review(
    &self,
    update: ReviewUpdate,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  fn get_review(
    &self,
    id: ReviewId,
  ) -> impl Future<Output = Result<Option<Review>, Self::Error>> + Send + '_;

  /// The reviews named by `ids`, in the order given. Unknown ids are skipped.
  fn reviews_by_ids(
    &self,
    ids: Vec<ReviewId>,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;

  /// Delete a review and its votes, recording `REVIEW/REMOVE` for the author.
  fn delete_review(
    &self,
    id: ReviewId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn review_exists(
    &self,
    id: ReviewId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Relationship graph ──────────────────────────────────────────────────────

/// Directed friendship edges and their state machine.
pub trait RelationshipGraph: Backend {
  /// `a` asks `b` to be friends; see
  /// [`resolve_request`](crate::friendship::resolve_request). Fails with
  /// `InvalidOperation` when `a == b`. Records `FRIEND/ADD` for `a` when the
  /// request changes state.
  fn request_friendship(
    &self,
    a: UserId,
    b: UserId,
  ) -> impl Future<Output = Result<RequestOutcome, Self::Error>> + Send + '_;

  /// Delete the edge `(a, b)` only. Idempotent; returns whether an edge was
  /// removed and records `FRIEND/REMOVE` for `a` if so.
  fn remove_friendship(
    &self,
    a: UserId,
    b: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Targets of `a`'s confirmed edges, ascending id.
  fn friends_of(
    &self,
    a: UserId,
  ) -> impl Future<Output = Result<Vec<UserId>, Self::Error>> + Send + '_;

  /// Targets of `a`'s pending outgoing edges, ascending id.
  fn pending_requests_of(
    &self,
    a: UserId,
  ) -> impl Future<Output = Result<Vec<UserId>, Self::Error>> + Send + '_;

  /// Users with a pending edge pointing at `a`, ascending id.
  fn incoming_requests_of(
    &self,
    a: UserId,
  ) -> impl Future<Output = Result<Vec<UserId>, Self::Error>> + Send + '_;

  /// Users that both `a` and `b` count as confirmed friends, ascending id.
  fn common_friends(
    &self,
    a: UserId,
    b: UserId,
  ) -> impl Future<Output = Result<Vec<UserId>, Self::Error>> + Send + '_;

  fn friendship_status(
    &self,
    a: UserId,
    b: UserId,
  ) -> impl Future<Output = Result<Option<FriendshipStatus>, Self::Error>>
  + Send
  + '_;

  /// Whether the edge `(a, b)` exists in any status.
  fn friendship_exists(
    &self,
    a: UserId,
    b: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
    let status = self.friendship_status(a, b);
    async move { status.await.map(|s| s.is_some()) }
  }

  /// Remove every edge touching `user`, in either direction.
  fn purge_user_friendships(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── Engagement ledger ───────────────────────────────────────────────────────

/// Film likes, review votes and the counters derived from them.
pub trait EngagementLedger: Backend {
  /// Idempotent insert of `(user, film)`. Records `LIKE/ADD` on every call,
  /// including repeats. Returns whether the edge is new.
  fn like_film(
    &self,
    user: UserId,
    film: FilmId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Idempotent delete. Records `LIKE/REMOVE` only if an edge was removed.
  fn unlike_film(
    &self,
    user: UserId,
    film: FilmId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Read from a counter maintained with every like/unlike.
  fn like_count_of(
    &self,
    film: FilmId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Every film the backend knows, with its like count (zero included).
  fn film_like_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<(FilmId, u64)>, Self::Error>> + Send + '_;

  fn films_liked_by(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<BTreeSet<FilmId>, Self::Error>> + Send + '_;

  /// Every like edge.
  fn film_likes(
    &self,
  ) -> impl Future<Output = Result<Vec<FilmLike>, Self::Error>> + Send + '_;

  /// Upsert `user`'s vote on `review`, adjusting usefulness by the
  /// [`usefulness_delta`](crate::engagement::usefulness_delta).
  fn set_review_vote(
    &self,
    review: ReviewId,
    user: UserId,
    is_like: bool,
  ) -> impl Future<Output = Result<VoteChange, Self::Error>> + Send + '_;

  /// Remove `user`'s vote on `review` and reverse its contribution. No-op
  /// if there is none, or if `only` is set and the vote has the other
  /// polarity. The check and the delete happen in one transaction.
  fn clear_review_vote(
    &self,
    review: ReviewId,
    user: UserId,
    only: Option<bool>,
  ) -> impl Future<Output = Result<VoteChange, Self::Error>> + Send + '_;

  fn review_vote(
    &self,
    review: ReviewId,
    user: UserId,
  ) -> impl Future<Output = Result<Option<bool>, Self::Error>> + Send + '_;

  fn usefulness_of(
    &self,
    review: ReviewId,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Usefulness of every review of `film`, or of every review at all.
  fn review_scores(
    &self,
    film: Option<FilmId>,
  ) -> impl Future<Output = Result<Vec<(ReviewId, i64)>, Self::Error>>
  + Send
  + '_;

  /// Drop every like and vote cast by `user`, keeping counters consistent.
  fn purge_by_user(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Drop every like on `film` and its counter.
  fn purge_by_film(
    &self,
    film: FilmId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Drop every vote on `review` and its score.
  fn purge_by_review(
    &self,
    review: ReviewId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Activity feed ───────────────────────────────────────────────────────────

/// The append-only, per-user event log.
pub trait ActivityFeed: Backend {
  /// Append an event stamped with the current time.
  fn record(
    &self,
    user: UserId,
    entity_id: i64,
    event_type: EventType,
    operation: Operation,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// `user`'s events in the order they were recorded, at most `limit`
  /// of them (zero meaning the default). Negative limits are rejected.
  fn feed_for(
    &self,
    user: UserId,
    limit: i64,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;
}

// ─── Full backend ────────────────────────────────────────────────────────────

/// A backend implementing every trait above. Blanket-implemented; exists so
/// callers can write one bound instead of four.
pub trait Store:
  EntityStore + RelationshipGraph + EngagementLedger + ActivityFeed
{
}

impl<T> Store for T where
  T: EntityStore + RelationshipGraph + EngagementLedger + ActivityFeed
{
}
