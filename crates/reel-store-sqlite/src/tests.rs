//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::NaiveDate;
use reel_core::{
  Engine, EntityKind,
  engagement::VoteChange,
  entity::{Film, NewFilm, NewReview, NewUser, ReviewUpdate},
  feed::{EventType, Operation},
  friendship::{FriendshipStatus, RequestOutcome},
  ids::{FilmId, ReviewId, UserId},
  ranking::RankingEngine,
  store::{ActivityFeed, EngagementLedger, EntityStore, RelationshipGraph},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(login: &str) -> NewUser {
  NewUser {
    name:     None,
    login:    login.into(),
    email:    format!("{login}@example.com"),
    birthday: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
  }
}

fn new_film(name: &str) -> NewFilm {
  NewFilm {
    name:         name.into(),
    description:  format!("{name}, the film"),
    release_date: NaiveDate::from_ymd_opt(1999, 3, 31).unwrap(),
    duration:     136,
  }
}

async fn user(s: &SqliteStore, login: &str) -> UserId {
  s.add_user(new_user(login)).await.unwrap().id
}

async fn film(s: &SqliteStore, name: &str) -> FilmId {
  s.add_film(new_film(name)).await.unwrap().id
}

async fn review(s: &SqliteStore, author: UserId, film: FilmId) -> ReviewId {
  s.add_review(NewReview {
    content:     "worth watching".into(),
    is_positive: true,
    user_id:     author,
    film_id:     film,
  })
  .await
  .unwrap()
  .id
}

fn is_core_not_found(err: &Error, expected: EntityKind) -> bool {
  matches!(
    err,
    Error::Core(reel_core::Error::NotFound { kind, .. }) if *kind == expected
  )
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;
  let added = s.add_user(new_user("neo")).await.unwrap();
  assert_eq!(added.name, "neo");

  let fetched = s.get_user(added.id).await.unwrap().unwrap();
  assert_eq!(fetched, added);
  assert!(s.user_exists(added.id).await.unwrap());
  assert!(!s.user_exists(UserId(999)).await.unwrap());
}

#[tokio::test]
async fn duplicate_login_is_invalid_operation() {
  let s = store().await;
  s.add_user(new_user("neo")).await.unwrap();

  let mut dup = new_user("neo");
  dup.email = "other@example.com".into();
  let err = s.add_user(dup).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(reel_core::Error::InvalidOperation(_))
  ));
}

#[tokio::test]
async fn update_missing_user_is_not_found() {
  let s = store().await;
  let mut u = s.add_user(new_user("neo")).await.unwrap();
  u.id = UserId(u.id.0 + 10);
  let err = s.update_user(u).await.unwrap_err();
  assert!(is_core_not_found(&err, EntityKind::User));
}

#[tokio::test]
async fn users_by_ids_keeps_requested_order() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;
  let users = s.users_by_ids(vec![b, UserId(77), a]).await.unwrap();
  let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
  assert_eq!(ids, vec![b, a]);
}

#[tokio::test]
async fn film_update_keeps_like_count() {
  let s = store().await;
  let u = user(&s, "u").await;
  let f = film(&s, "Matrix").await;
  s.like_film(u, f).await.unwrap();

  let mut current = s.get_film(f).await.unwrap().unwrap();
  assert_eq!(current.likes, 1);
  current.name = "The Matrix".into();
  current.likes = 40;
  let updated: Film = s.update_film(current).await.unwrap();
  assert_eq!(updated.name, "The Matrix");
  assert_eq!(updated.likes, 1);
}

// ─── Relationship graph ──────────────────────────────────────────────────────

#[tokio::test]
async fn request_is_pending_not_friend() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  let outcome = s.request_friendship(a, b).await.unwrap();
  assert_eq!(outcome, RequestOutcome::Requested);
  assert_eq!(s.pending_requests_of(a).await.unwrap(), vec![b]);
  assert!(s.friends_of(a).await.unwrap().is_empty());
  assert_eq!(s.incoming_requests_of(b).await.unwrap(), vec![a]);
  assert!(s.friendship_exists(a, b).await.unwrap());
  assert!(!s.friendship_exists(b, a).await.unwrap());
}

#[tokio::test]
async fn self_request_is_rejected_without_writing() {
  let s = store().await;
  let a = user(&s, "a").await;

  let err = s.request_friendship(a, a).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(reel_core::Error::InvalidOperation(_))
  ));
  assert!(s.feed_for(a, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn reciprocal_request_confirms_both() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  s.request_friendship(a, b).await.unwrap();
  let outcome = s.request_friendship(b, a).await.unwrap();
  assert_eq!(outcome, RequestOutcome::Confirmed);

  assert_eq!(s.friends_of(a).await.unwrap(), vec![b]);
  assert_eq!(s.friends_of(b).await.unwrap(), vec![a]);
  assert!(s.pending_requests_of(a).await.unwrap().is_empty());
  assert_eq!(
    s.friendship_status(a, b).await.unwrap(),
    Some(FriendshipStatus::Confirmed)
  );

  // Repeating either call changes nothing and records nothing.
  let feed_before = s.feed_for(a, 0).await.unwrap().len();
  assert_eq!(
    s.request_friendship(a, b).await.unwrap(),
    RequestOutcome::AlreadyFriends
  );
  assert_eq!(
    s.request_friendship(b, a).await.unwrap(),
    RequestOutcome::AlreadyFriends
  );
  assert_eq!(s.friends_of(a).await.unwrap(), vec![b]);
  assert_eq!(s.friends_of(b).await.unwrap(), vec![a]);
  assert_eq!(s.feed_for(a, 0).await.unwrap().len(), feed_before);
}

#[tokio::test]
async fn repeated_request_stays_pending() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  s.request_friendship(a, b).await.unwrap();
  assert_eq!(
    s.request_friendship(a, b).await.unwrap(),
    RequestOutcome::AlreadyRequested
  );
  assert_eq!(s.pending_requests_of(a).await.unwrap(), vec![b]);
  assert_eq!(s.feed_for(a, 0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn removal_is_asymmetric() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  s.request_friendship(a, b).await.unwrap();
  assert_eq!(s.pending_requests_of(a).await.unwrap(), vec![b]);
  s.request_friendship(b, a).await.unwrap();
  assert_eq!(s.friends_of(a).await.unwrap(), vec![b]);
  assert_eq!(s.friends_of(b).await.unwrap(), vec![a]);

  assert!(s.remove_friendship(a, b).await.unwrap());
  assert!(s.friends_of(a).await.unwrap().is_empty());
  assert_eq!(s.friends_of(b).await.unwrap(), vec![a]);
}

#[tokio::test]
async fn removal_is_idempotent() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;
  s.request_friendship(a, b).await.unwrap();

  assert!(s.remove_friendship(a, b).await.unwrap());
  assert!(!s.remove_friendship(a, b).await.unwrap());
  // Never existed at all.
  assert!(!s.remove_friendship(b, a).await.unwrap());
  assert!(s.pending_requests_of(a).await.unwrap().is_empty());

  let removes = s
    .feed_for(a, 0)
    .await
    .unwrap()
    .into_iter()
    .filter(|e| e.operation == Operation::Remove)
    .count();
  assert_eq!(removes, 1);
}

#[tokio::test]
async fn re_request_after_one_sided_removal_is_pending() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;
  s.request_friendship(a, b).await.unwrap();
  s.request_friendship(b, a).await.unwrap();

  // b drops a, then asks again; a's confirmed edge does not count as a request.
  s.remove_friendship(b, a).await.unwrap();
  assert_eq!(
    s.request_friendship(b, a).await.unwrap(),
    RequestOutcome::Requested
  );
  assert_eq!(s.pending_requests_of(b).await.unwrap(), vec![a]);
  assert_eq!(s.friends_of(a).await.unwrap(), vec![b]);
}

#[tokio::test]
async fn common_friends_intersects_confirmed_lists() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;
  let c = user(&s, "c").await;
  let d = user(&s, "d").await;

  for (x, y) in [(a, c), (b, c), (a, d)] {
    s.request_friendship(x, y).await.unwrap();
    s.request_friendship(y, x).await.unwrap();
  }
  // b's edge to d is only pending, so d is not common.
  s.request_friendship(b, d).await.unwrap();

  assert_eq!(s.common_friends(a, b).await.unwrap(), vec![c]);
}

// ─── Engagement ledger ───────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_likes_count_once_but_all_reach_the_feed() {
  let s = store().await;
  let u = user(&s, "u").await;
  let f = film(&s, "Heat").await;

  assert!(s.like_film(u, f).await.unwrap());
  assert!(!s.like_film(u, f).await.unwrap());
  assert!(!s.like_film(u, f).await.unwrap());
  assert_eq!(s.like_count_of(f).await.unwrap(), 1);

  let likes = s
    .feed_for(u, 0)
    .await
    .unwrap()
    .into_iter()
    .filter(|e| e.event_type == EventType::Like && e.operation == Operation::Add)
    .count();
  assert_eq!(likes, 3);

  assert!(s.unlike_film(u, f).await.unwrap());
  assert_eq!(s.like_count_of(f).await.unwrap(), 0);
  assert!(!s.unlike_film(u, f).await.unwrap());
  assert_eq!(s.like_count_of(f).await.unwrap(), 0);
}

#[tokio::test]
async fn unlike_without_like_records_nothing() {
  let s = store().await;
  let u = user(&s, "u").await;
  let f = film(&s, "Heat").await;
  assert!(!s.unlike_film(u, f).await.unwrap());
  assert!(s.feed_for(u, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn vote_flip_moves_usefulness_by_two() {
  let s = store().await;
  let author = user(&s, "author").await;
  let voter = user(&s, "voter").await;
  let f = film(&s, "Alien").await;
  let r = review(&s, author, f).await;

  assert_eq!(
    s.set_review_vote(r, voter, true).await.unwrap(),
    VoteChange::Cast
  );
  let single = s.usefulness_of(r).await.unwrap();
  assert_eq!(single, 1);

  assert_eq!(
    s.set_review_vote(r, voter, true).await.unwrap(),
    VoteChange::Unchanged
  );
  assert_eq!(s.usefulness_of(r).await.unwrap(), single);

  assert_eq!(
    s.set_review_vote(r, voter, false).await.unwrap(),
    VoteChange::Flipped
  );
  assert_eq!(s.usefulness_of(r).await.unwrap(), single - 2);
  assert_eq!(s.review_vote(r, voter).await.unwrap(), Some(false));

  assert_eq!(
    s.clear_review_vote(r, voter, None).await.unwrap(),
    VoteChange::Cleared
  );
  assert_eq!(s.usefulness_of(r).await.unwrap(), 0);
  assert_eq!(
    s.clear_review_vote(r, voter, None).await.unwrap(),
    VoteChange::Unchanged
  );

  let ops: Vec<Operation> = s
    .feed_for(voter, 0)
    .await
    .unwrap()
    .into_iter()
    .filter(|e| e.event_type == EventType::Vote)
    .map(|e| e.operation)
    .collect();
  assert_eq!(ops, vec![Operation::Add, Operation::Update, Operation::Remove]);
}

#[tokio::test]
async fn clearing_a_like_leaves_a_newer_dislike() {
  let s = store().await;
  let author = user(&s, "author").await;
  let voter = user(&s, "voter").await;
  let f = film(&s, "Alien").await;
  let r = review(&s, author, f).await;

  s.set_review_vote(r, voter, true).await.unwrap();
  assert_eq!(s.review_vote(r, voter).await.unwrap(), Some(true));
  // The vote flips after the caller last looked at it.
  s.set_review_vote(r, voter, false).await.unwrap();

  assert_eq!(
    s.clear_review_vote(r, voter, Some(true)).await.unwrap(),
    VoteChange::Unchanged
  );
  assert_eq!(s.review_vote(r, voter).await.unwrap(), Some(false));
  assert_eq!(s.usefulness_of(r).await.unwrap(), -1);

  let ops: Vec<Operation> = s
    .feed_for(voter, 0)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.operation)
    .collect();
  assert_eq!(ops, vec![Operation::Add, Operation::Update]);

  assert_eq!(
    s.clear_review_vote(r, voter, Some(false)).await.unwrap(),
    VoteChange::Cleared
  );
  assert_eq!(s.usefulness_of(r).await.unwrap(), 0);
}

#[tokio::test]
async fn review_reads_carry_usefulness() {
  let s = store().await;
  let author = user(&s, "author").await;
  let v1 = user(&s, "v1").await;
  let v2 = user(&s, "v2").await;
  let v3 = user(&s, "v3").await;
  let f = film(&s, "Alien").await;
  let r = review(&s, author, f).await;

  s.set_review_vote(r, v1, true).await.unwrap();
  s.set_review_vote(r, v2, true).await.unwrap();
  s.set_review_vote(r, v3, false).await.unwrap();

  let fetched = s.get_review(r).await.unwrap().unwrap();
  assert_eq!(fetched.useful, 1);
}

#[tokio::test]
async fn purge_by_user_unwinds_counters() {
  let s = store().await;
  let author = user(&s, "author").await;
  let u = user(&s, "u").await;
  let other = user(&s, "other").await;
  let f = film(&s, "Alien").await;
  let r = review(&s, author, f).await;

  s.like_film(u, f).await.unwrap();
  s.like_film(other, f).await.unwrap();
  s.set_review_vote(r, u, false).await.unwrap();
  s.set_review_vote(r, other, true).await.unwrap();
  assert_eq!(s.usefulness_of(r).await.unwrap(), 0);

  s.purge_by_user(u).await.unwrap();
  assert_eq!(s.like_count_of(f).await.unwrap(), 1);
  assert_eq!(s.usefulness_of(r).await.unwrap(), 1);
  assert!(s.films_liked_by(u).await.unwrap().is_empty());
  assert_eq!(s.review_vote(r, u).await.unwrap(), None);
}

#[tokio::test]
async fn purge_by_film_and_review() {
  let s = store().await;
  let author = user(&s, "author").await;
  let u = user(&s, "u").await;
  let f = film(&s, "Alien").await;
  let r = review(&s, author, f).await;
  s.like_film(u, f).await.unwrap();
  s.set_review_vote(r, u, true).await.unwrap();

  s.purge_by_film(f).await.unwrap();
  assert_eq!(s.like_count_of(f).await.unwrap(), 0);
  assert!(s.film_likes().await.unwrap().is_empty());

  s.purge_by_review(r).await.unwrap();
  assert_eq!(s.usefulness_of(r).await.unwrap(), 0);
  assert_eq!(s.review_vote(r, u).await.unwrap(), None);
}

// ─── Cascading deletes ───────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_a_user_purges_their_edges() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;
  let f = film(&s, "Alien").await;
  let a_review = review(&s, a, f).await;
  let b_review = review(&s, b, f).await;

  s.request_friendship(a, b).await.unwrap();
  s.request_friendship(b, a).await.unwrap();
  s.like_film(a, f).await.unwrap();
  s.set_review_vote(b_review, a, true).await.unwrap();

  assert!(s.delete_user(a).await.unwrap());
  assert!(!s.delete_user(a).await.unwrap());

  assert!(s.friends_of(b).await.unwrap().is_empty());
  assert_eq!(s.like_count_of(f).await.unwrap(), 0);
  assert_eq!(s.usefulness_of(b_review).await.unwrap(), 0);
  assert!(s.get_review(a_review).await.unwrap().is_none());
  assert!(s.get_review(b_review).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_a_film_removes_its_reviews_and_likes() {
  let s = store().await;
  let u = user(&s, "u").await;
  let f = film(&s, "Alien").await;
  let r = review(&s, u, f).await;
  s.like_film(u, f).await.unwrap();

  assert!(s.delete_film(f).await.unwrap());
  assert!(s.get_film(f).await.unwrap().is_none());
  assert!(!s.review_exists(r).await.unwrap());
  assert!(s.films_liked_by(u).await.unwrap().is_empty());
}

#[tokio::test]
async fn review_lifecycle_reaches_author_feed() {
  let s = store().await;
  let u = user(&s, "u").await;
  let f = film(&s, "Alien").await;
  let r = review(&s, u, f).await;

  let edited = s
    .update_review(ReviewUpdate {
      id:          r,
      content:     "changed my mind".into(),
      is_positive: false,
    })
    .await
    .unwrap();
  assert!(!edited.is_positive);
  assert_eq!(edited.user_id, u);
  assert!(s.delete_review(r).await.unwrap());
  assert!(!s.delete_review(r).await.unwrap());

  let ops: Vec<(EventType, Operation, i64)> = s
    .feed_for(u, 0)
    .await
    .unwrap()
    .into_iter()
    .map(|e| (e.event_type, e.operation, e.entity_id))
    .collect();
  assert_eq!(
    ops,
    vec![
      (EventType::Review, Operation::Add, r.0),
      (EventType::Review, Operation::Update, r.0),
      (EventType::Review, Operation::Remove, r.0),
    ]
  );
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn popular_films_break_ties_by_id() {
  let s = store().await;
  let users = [
    user(&s, "u1").await,
    user(&s, "u2").await,
    user(&s, "u3").await,
  ];
  let f1 = film(&s, "F1").await;
  let f2 = film(&s, "F2").await;
  let f3 = film(&s, "F3").await;

  for u in users {
    s.like_film(u, f2).await.unwrap();
    s.like_film(u, f1).await.unwrap();
  }
  s.like_film(users[0], f3).await.unwrap();

  let ranking = RankingEngine::new(&s);
  for _ in 0..3 {
    let top: Vec<FilmId> = ranking
      .popular_films(2)
      .await
      .unwrap()
      .into_iter()
      .map(|p| p.film_id)
      .collect();
    assert_eq!(top, vec![f1, f2]);
  }
  assert!(ranking.popular_films(0).await.unwrap().is_empty());
  assert_eq!(ranking.popular_films(10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn most_liked_film_wins() {
  let s = store().await;
  let u1 = user(&s, "u1").await;
  let u2 = user(&s, "u2").await;
  let f1 = film(&s, "F1").await;
  let f2 = film(&s, "F2").await;

  s.like_film(u1, f1).await.unwrap();
  s.like_film(u2, f1).await.unwrap();
  s.like_film(u1, f2).await.unwrap();

  let top = RankingEngine::new(&s).popular_films(1).await.unwrap();
  assert_eq!(top.len(), 1);
  assert_eq!(top[0].film_id, f1);
  assert_eq!(top[0].likes, 2);

  let feed = s.feed_for(u1, 10).await.unwrap();
  let entities: Vec<i64> = feed.iter().map(|e| e.entity_id).collect();
  assert_eq!(entities, vec![f1.0, f2.0]);
  assert!(feed.iter().all(|e| e.event_type == EventType::Like));
  assert!(feed[0].timestamp <= feed[1].timestamp);
}

#[tokio::test]
async fn top_reviews_rank_by_usefulness() {
  let s = store().await;
  let author = user(&s, "author").await;
  let v1 = user(&s, "v1").await;
  let v2 = user(&s, "v2").await;
  let f = film(&s, "Alien").await;
  let other = film(&s, "Aliens").await;

  let r1 = review(&s, author, f).await;
  let r2 = review(&s, author, f).await;
  let r3 = review(&s, author, f).await;
  let elsewhere = review(&s, author, other).await;

  s.set_review_vote(r3, v1, true).await.unwrap();
  s.set_review_vote(r3, v2, true).await.unwrap();
  s.set_review_vote(r1, v1, false).await.unwrap();
  s.set_review_vote(elsewhere, v1, true).await.unwrap();

  let ranking = RankingEngine::new(&s);
  let ranked: Vec<ReviewId> = ranking
    .top_reviews(f, 10)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.review_id)
    .collect();
  assert_eq!(ranked, vec![r3, r2, r1]);

  let overall = ranking.top_reviews_overall(2).await.unwrap();
  assert_eq!(overall[0].review_id, r3);
  assert_eq!(overall[1].review_id, elsewhere);
}

#[tokio::test]
async fn common_films_and_recommendations() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;
  let c = user(&s, "c").await;
  let f1 = film(&s, "F1").await;
  let f2 = film(&s, "F2").await;
  let f3 = film(&s, "F3").await;

  for f in [f1, f2] {
    s.like_film(a, f).await.unwrap();
  }
  for f in [f1, f2, f3] {
    s.like_film(b, f).await.unwrap();
  }
  s.like_film(c, f3).await.unwrap();

  let ranking = RankingEngine::new(&s);
  let common: Vec<FilmId> = ranking
    .common_films(a, b)
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.film_id)
    .collect();
  assert_eq!(common, vec![f1, f2]);

  let picks: Vec<FilmId> = ranking
    .recommend_films(a)
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.film_id)
    .collect();
  assert_eq!(picks, vec![f3]);
}

// ─── Activity feed ───────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_is_scoped_ordered_and_limited() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  for entity in 1..=30 {
    s.record(a, entity, EventType::Like, Operation::Add)
      .await
      .unwrap();
  }
  s.record(b, 99, EventType::Friend, Operation::Add)
    .await
    .unwrap();

  let default = s.feed_for(a, 0).await.unwrap();
  assert_eq!(default.len(), 25);
  assert!(default.iter().all(|e| e.user_id == a));
  let entities: Vec<i64> = default.iter().map(|e| e.entity_id).collect();
  assert_eq!(entities, (1..=25).collect::<Vec<_>>());

  assert_eq!(s.feed_for(a, 5).await.unwrap().len(), 5);
  assert_eq!(s.feed_for(a, 100).await.unwrap().len(), 30);
  assert_eq!(s.feed_for(b, 0).await.unwrap().len(), 1);

  let err = s.feed_for(a, -1).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(reel_core::Error::InvalidOperation(_))
  ));
}

#[tokio::test]
async fn friendship_events_name_the_other_user() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;
  s.request_friendship(a, b).await.unwrap();
  s.request_friendship(b, a).await.unwrap();

  let a_feed = s.feed_for(a, 0).await.unwrap();
  let b_feed = s.feed_for(b, 0).await.unwrap();
  assert_eq!(a_feed.len(), 1);
  assert_eq!(b_feed.len(), 1);
  assert_eq!(
    (a_feed[0].event_type, a_feed[0].operation, a_feed[0].entity_id),
    (EventType::Friend, Operation::Add, b.0)
  );
  assert_eq!(b_feed[0].entity_id, a.0);
}

#[tokio::test]
async fn feed_order_ignores_clock_steps() {
  let s = store().await;
  let u = user(&s, "u").await;
  for entity in 1..=3 {
    s.record(u, entity, EventType::Like, Operation::Add)
      .await
      .unwrap();
  }
  // Simulate the clock stepping back before the last event was written.
  s.conn
    .call(|conn| {
      conn.execute(
        "UPDATE events SET recorded_at = '1999-01-01T00:00:00.000000Z'
         WHERE entity_id = 3",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let entities: Vec<i64> = s
    .feed_for(u, 0)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.entity_id)
    .collect();
  assert_eq!(entities, vec![1, 2, 3]);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reciprocal_requests_make_friends() {
  let s = Arc::new(store().await);

  for round in 0..20 {
    let a = user(&s, &format!("a{round}")).await;
    let b = user(&s, &format!("b{round}")).await;

    let (s1, s2) = (Arc::clone(&s), Arc::clone(&s));
    let forward = tokio::spawn(async move { s1.request_friendship(a, b).await });
    let backward = tokio::spawn(async move { s2.request_friendship(b, a).await });
    let outcomes = [
      forward.await.unwrap().unwrap(),
      backward.await.unwrap().unwrap(),
    ];

    assert!(outcomes.contains(&RequestOutcome::Requested), "{outcomes:?}");
    assert!(outcomes.contains(&RequestOutcome::Confirmed), "{outcomes:?}");
    assert_eq!(s.friends_of(a).await.unwrap(), vec![b]);
    assert_eq!(s.friends_of(b).await.unwrap(), vec![a]);
    assert!(s.pending_requests_of(a).await.unwrap().is_empty());
    assert!(s.pending_requests_of(b).await.unwrap().is_empty());
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_keep_the_counter_exact() {
  const FANS: usize = 25;
  let s = Arc::new(store().await);
  let f = film(&s, "Crowd Pleaser").await;

  let mut fans = Vec::with_capacity(FANS);
  for i in 0..FANS {
    fans.push(user(&s, &format!("fan{i}")).await);
  }

  // Every fan likes twice at once; only the first of each pair counts.
  let tasks: Vec<_> = fans
    .iter()
    .chain(fans.iter())
    .map(|&u| {
      let s = Arc::clone(&s);
      tokio::spawn(async move { s.like_film(u, f).await })
    })
    .collect();
  let mut inserted = 0;
  for task in tasks {
    if task.await.unwrap().unwrap() {
      inserted += 1;
    }
  }

  assert_eq!(inserted, FANS);
  assert_eq!(s.like_count_of(f).await.unwrap(), FANS as u64);
  assert_eq!(s.film_likes().await.unwrap().len(), FANS);
}

// ─── Engine ──────────────────────────────────────────────────────────────────

async fn engine() -> Engine<SqliteStore> { Engine::new(Arc::new(store().await)) }

#[tokio::test]
async fn engine_rejects_unknown_users() {
  let e = engine().await;
  let a = e.create_user(new_user("a")).await.unwrap().id;

  let err = e.request_friendship(a, UserId(404)).await.unwrap_err();
  assert!(is_core_not_found(&err, EntityKind::User));
  let err = e.feed_for(UserId(404), 0).await.unwrap_err();
  assert!(is_core_not_found(&err, EntityKind::User));
  assert!(e.store().feed_for(a, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn engine_validates_payloads() {
  let e = engine().await;
  let mut bad = new_user("has space");
  bad.email = "x@example.com".into();
  let err = e.create_user(bad).await.unwrap_err();
  assert!(matches!(err, Error::Core(reel_core::Error::Validation(_))));

  let mut early = new_film("Too early");
  early.release_date = NaiveDate::from_ymd_opt(1800, 1, 1).unwrap();
  assert!(e.create_film(early).await.is_err());
  assert!(e.films().await.unwrap().is_empty());
}

#[tokio::test]
async fn engine_names_blank_users_after_login() {
  let e = engine().await;
  let mut input = new_user("trinity");
  input.name = Some("  ".into());
  let u = e.create_user(input).await.unwrap();
  assert_eq!(u.name, "trinity");
}

#[tokio::test]
async fn engine_hydrates_friends_and_rankings() {
  let e = engine().await;
  let a = e.create_user(new_user("a")).await.unwrap();
  let b = e.create_user(new_user("b")).await.unwrap();
  let f = e.create_film(new_film("Heat")).await.unwrap();

  e.request_friendship(a.id, b.id).await.unwrap();
  assert_eq!(e.pending_requests_of(a.id).await.unwrap(), vec![b.clone()]);
  e.request_friendship(b.id, a.id).await.unwrap();
  assert_eq!(e.friends_of(a.id).await.unwrap(), vec![b.clone()]);

  e.like_film(a.id, f.id).await.unwrap();
  let popular = e.popular_films(10).await.unwrap();
  assert_eq!(popular.len(), 1);
  assert_eq!(popular[0].likes, 1);

  let err = e.like_film(a.id, FilmId(404)).await.unwrap_err();
  assert!(is_core_not_found(&err, EntityKind::Film));
}

#[tokio::test]
async fn engine_clears_only_matching_polarity() {
  let e = engine().await;
  let author = e.create_user(new_user("author")).await.unwrap().id;
  let voter = e.create_user(new_user("voter")).await.unwrap().id;
  let f = e.create_film(new_film("Heat")).await.unwrap().id;
  let r = e
    .create_review(NewReview {
      content:     "tense".into(),
      is_positive: true,
      user_id:     author,
      film_id:     f,
    })
    .await
    .unwrap()
    .id;

  e.set_review_vote(r, voter, true).await.unwrap();
  assert_eq!(
    e.clear_review_vote(r, voter, Some(false)).await.unwrap(),
    VoteChange::Unchanged
  );
  assert_eq!(e.usefulness_of(r).await.unwrap(), 1);
  assert_eq!(
    e.clear_review_vote(r, voter, Some(true)).await.unwrap(),
    VoteChange::Cleared
  );
  assert_eq!(e.usefulness_of(r).await.unwrap(), 0);

  let err = e.set_review_vote(ReviewId(404), voter, true).await.unwrap_err();
  assert!(is_core_not_found(&err, EntityKind::Review));
}
