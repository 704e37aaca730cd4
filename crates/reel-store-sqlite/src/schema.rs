//! SQL schema for the Reel SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Entities ────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS users (
    user_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name      TEXT NOT NULL,
    login     TEXT NOT NULL UNIQUE,
    email     TEXT NOT NULL UNIQUE,
    birthday  TEXT NOT NULL           -- YYYY-MM-DD
);

CREATE TABLE IF NOT EXISTS films (
    film_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    release_date TEXT NOT NULL,       -- YYYY-MM-DD
    duration     INTEGER NOT NULL CHECK (duration > 0)
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    content     TEXT NOT NULL,
    is_positive INTEGER NOT NULL,
    user_id     INTEGER NOT NULL REFERENCES users(user_id),
    film_id     INTEGER NOT NULL REFERENCES films(film_id)
);

-- ── Relationship graph ──────────────────────────────────────────────────────

-- Directed: (a, b) and (b, a) are independent rows.
CREATE TABLE IF NOT EXISTS friendships (
    requester_id INTEGER NOT NULL REFERENCES users(user_id),
    target_id    INTEGER NOT NULL REFERENCES users(user_id),
    status       TEXT NOT NULL,       -- 'PENDING' | 'CONFIRMED'
    PRIMARY KEY (requester_id, target_id),
    CHECK (requester_id != target_id)
);

-- ── Engagement ledger ───────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS film_likes (
    film_id INTEGER NOT NULL REFERENCES films(film_id),
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    PRIMARY KEY (film_id, user_id)
);

-- Maintained in the same transaction as every film_likes insert/delete.
CREATE TABLE IF NOT EXISTS film_like_counts (
    film_id INTEGER PRIMARY KEY REFERENCES films(film_id),
    likes   INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0)
);

CREATE TABLE IF NOT EXISTS review_votes (
    review_id INTEGER NOT NULL REFERENCES reviews(review_id),
    user_id   INTEGER NOT NULL REFERENCES users(user_id),
    is_like   INTEGER NOT NULL,
    PRIMARY KEY (review_id, user_id)
);

-- Maintained in the same transaction as every review_votes change.
CREATE TABLE IF NOT EXISTS review_scores (
    review_id INTEGER PRIMARY KEY REFERENCES reviews(review_id),
    useful    INTEGER NOT NULL DEFAULT 0
);

-- ── Activity feed ───────────────────────────────────────────────────────────

-- Strictly append-only. No UPDATE or DELETE is ever issued against this
-- table, so it carries no foreign keys.
CREATE TABLE IF NOT EXISTS events (
    event_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL,
    entity_id   INTEGER NOT NULL,
    event_type  TEXT NOT NULL,        -- 'FRIEND' | 'LIKE' | 'REVIEW' | 'VOTE'
    operation   TEXT NOT NULL,        -- 'ADD' | 'REMOVE' | 'UPDATE'
    recorded_at TEXT NOT NULL         -- fixed-width RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS friendships_target_idx ON friendships(target_id);
CREATE INDEX IF NOT EXISTS film_likes_user_idx    ON film_likes(user_id);
CREATE INDEX IF NOT EXISTS review_votes_user_idx  ON review_votes(user_id);
CREATE INDEX IF NOT EXISTS reviews_film_idx       ON reviews(film_id);
DROP INDEX IF EXISTS events_user_idx;
CREATE INDEX IF NOT EXISTS events_user_seq_idx    ON events(user_id, event_id);

PRAGMA user_version = 2;
";
