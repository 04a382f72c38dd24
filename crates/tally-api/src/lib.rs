//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any storage
//! [`Backend`]. Auth, TLS, and transport concerns are the caller's
//! responsibility; rater ids arrive already authenticated.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod ratings;
pub mod stats;
pub mod tier_lists;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde_json::{Value, json};
use tally_core::{engine::Engine, store::Backend};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: Backend + 'static,
{
  Router::new()
    // Vocabulary
    .route("/levels", get(stats::levels::<S>))
    // Ratings
    .route("/ratings", get(ratings::list::<S>).post(ratings::submit::<S>))
    .route(
      "/contents/{content_id}/ratings/{rater_id}",
      get(ratings::get_one::<S>).delete(ratings::delete_one::<S>),
    )
    // Stats
    .route("/contents/{content_id}/stats", get(stats::content::<S>))
    .route("/stats", get(stats::overview::<S>))
    .route("/tiers", get(stats::board::<S>))
    // Tier lists
    .route("/tier-lists", get(tier_lists::list::<S>).post(tier_lists::create::<S>))
    .route("/tier-lists/seed", post(tier_lists::seed::<S>))
    .route(
      "/tier-lists/{id}",
      get(tier_lists::get_one::<S>)
        .put(tier_lists::replace::<S>)
        .delete(tier_lists::delete_one::<S>),
    )
    .route("/tier-lists/{id}/move", post(tier_lists::move_item::<S>))
    .route(
      "/tier-lists/{id}/items",
      post(tier_lists::add_item::<S>).delete(tier_lists::remove_item::<S>),
    )
    .route("/health", get(health))
    .with_state(engine)
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests;
