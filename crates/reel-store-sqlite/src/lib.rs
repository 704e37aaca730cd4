//! SQLite backend for the Reel engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every public operation runs inside a
//! single transaction on that thread, which serialises concurrent callers and
//! makes each edge write, its counter update and its feed event commit
//! together.

mod encode;
mod feed;
mod graph;
mod ledger;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
