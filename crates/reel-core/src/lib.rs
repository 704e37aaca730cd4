//! Core types and trait definitions for the Reel relationship & ranking
//! engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the friendship state machine, review-vote scoring, ranking projections and
//! the activity-feed vocabulary; storage backends implement the traits in
//! [`store`], and [`Engine`] layers input validation on top of them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod engagement;
pub mod engine;
pub mod entity;
pub mod error;
pub mod feed;
pub mod friendship;
pub mod ids;
pub mod ranking;
pub mod store;
pub mod validate;

pub use engine::Engine;
pub use error::{EntityKind, Error, Result};
