//! Core types and trait definitions for the Tally rating engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; storage backends implement the traits in
//! [`store`], and the [`engine::Engine`] ties them to the pure aggregation and
//! classification logic.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod classify;
pub mod engine;
pub mod error;
pub mod level;
pub mod rating;
pub mod stats;
pub mod store;
pub mod tier_list;

pub use error::{Error, ErrorKind, Result};
