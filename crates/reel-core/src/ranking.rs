//! Popularity projections over the engagement ledger.
//!
//! Nothing here is cached: every call re-reads the ledger and re-sorts. Ties
//! are always broken by ascending identifier so repeated calls over the same
//! state return the same order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
  engagement::FilmLike,
  ids::{FilmId, ReviewId, UserId},
  store::EngagementLedger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularFilm {
  pub film_id: FilmId,
  pub likes:   u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedReview {
  pub review_id: ReviewId,
  pub useful:    i64,
}

/// Non-positive limits select nothing.
fn take(limit: i64) -> usize {
  if limit <= 0 {
    0
  } else {
    usize::try_from(limit).unwrap_or(usize::MAX)
  }
}

/// Order films by like count, most liked first, and keep the first `limit`.
pub fn rank_films(
  counts: impl IntoIterator<Item = (FilmId, u64)>,
  limit: i64,
) -> Vec<PopularFilm> {
  let n = take(limit);
  if n == 0 {
    return Vec::new();
  }
  let mut ranked: Vec<PopularFilm> = counts
    .into_iter()
    .map(|(film_id, likes)| PopularFilm { film_id, likes })
    .collect();
  ranked.sort_by(|a, b| b.likes.cmp(&a.likes).then(a.film_id.cmp(&b.film_id)));
  ranked.truncate(n);
  ranked
}

/// Order reviews by usefulness, most useful first, and keep the first
/// `limit`.
pub fn rank_reviews(
  scores: impl IntoIterator<Item = (ReviewId, i64)>,
  limit: i64,
) -> Vec<RankedReview> {
  let n = take(limit);
  if n == 0 {
    return Vec::new();
  }
  let mut ranked: Vec<RankedReview> = scores
    .into_iter()
    .map(|(review_id, useful)| RankedReview { review_id, useful })
    .collect();
  ranked
    .sort_by(|a, b| b.useful.cmp(&a.useful).then(a.review_id.cmp(&b.review_id)));
  ranked.truncate(n);
  ranked
}

/// Films to suggest to `user`: find the other users whose liked films
/// overlap most with `user`'s, and collect what they liked that `user` has
/// not. Users with no likes, or no overlap with anyone, get nothing.
pub fn recommend(user: UserId, likes: &[FilmLike]) -> BTreeSet<FilmId> {
  let mut by_user: BTreeMap<UserId, BTreeSet<FilmId>> = BTreeMap::new();
  for like in likes {
    by_user.entry(like.user_id).or_default().insert(like.film_id);
  }

  let Some(mine) = by_user.remove(&user) else {
    return BTreeSet::new();
  };

  let overlap = |theirs: &BTreeSet<FilmId>| mine.intersection(theirs).count();
  let best = by_user.values().map(overlap).max().unwrap_or(0);
  if best == 0 {
    return BTreeSet::new();
  }

  by_user
    .values()
    .filter(|theirs| overlap(*theirs) == best)
    .flat_map(|theirs| theirs.difference(&mine).copied())
    .collect()
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Read-side projections over any [`EngagementLedger`].
pub struct RankingEngine<'a, L> {
  ledger: &'a L,
}

impl<'a, L: EngagementLedger> RankingEngine<'a, L> {
  pub fn new(ledger: &'a L) -> Self { Self { ledger } }

  /// Films by like count, descending; ties by ascending id.
  pub async fn popular_films(
    &self,
    limit: i64,
  ) -> Result<Vec<PopularFilm>, L::Error> {
    if take(limit) == 0 {
      return Ok(Vec::new());
    }
    let counts = self.ledger.film_like_counts().await?;
    Ok(rank_films(counts, limit))
  }

  /// Reviews of `film` by usefulness, descending; ties by ascending id.
  pub async fn top_reviews(
    &self,
    film: FilmId,
    limit: i64,
  ) -> Result<Vec<RankedReview>, L::Error> {
    if take(limit) == 0 {
      return Ok(Vec::new());
    }
    let scores = self.ledger.review_scores(Some(film)).await?;
    Ok(rank_reviews(scores, limit))
  }

  /// Like [`top_reviews`](Self::top_reviews) across every film.
  pub async fn top_reviews_overall(
    &self,
    limit: i64,
  ) -> Result<Vec<RankedReview>, L::Error> {
    if take(limit) == 0 {
      return Ok(Vec::new());
    }
    let scores = self.ledger.review_scores(None).await?;
    Ok(rank_reviews(scores, limit))
  }

  /// Films liked by both `a` and `b`, most popular first.
  pub async fn common_films(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Vec<PopularFilm>, L::Error> {
    let liked_a = self.ledger.films_liked_by(a).await?;
    let liked_b = self.ledger.films_liked_by(b).await?;
    let shared: BTreeSet<FilmId> =
      liked_a.intersection(&liked_b).copied().collect();
    self.rank_subset(&shared).await
  }

  /// Films recommended to `user` (see [`recommend`]), most popular first.
  pub async fn recommend_films(
    &self,
    user: UserId,
  ) -> Result<Vec<PopularFilm>, L::Error> {
    let likes = self.ledger.film_likes().await?;
    let picks = recommend(user, &likes);
    self.rank_subset(&picks).await
  }

  async fn rank_subset(
    &self,
    films: &BTreeSet<FilmId>,
  ) -> Result<Vec<PopularFilm>, L::Error> {
    if films.is_empty() {
      return Ok(Vec::new());
    }
    let counts = self.ledger.film_like_counts().await?;
    Ok(rank_films(
      counts.into_iter().filter(|(id, _)| films.contains(id)),
      i64::MAX,
    ))
  }
}
