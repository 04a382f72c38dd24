//! Storage contracts consumed by the [`Engine`](crate::engine::Engine).
//!
//! The traits are implemented by storage backends (e.g.
//! `tally-store-sqlite`). Higher layers depend on these abstractions, not on
//! any concrete backend. A single backend type normally implements all three,
//! sharing one [`Store::Error`].
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  rating::{NewRating, Rating, UpsertOutcome},
  stats::ContentStats,
  tier_list::TierList,
};

/// Shared error type for a backend.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

pub trait RatingStore: Store {
  /// Create or replace the rating keyed by `(content_id, rater_id)`.
  ///
  /// Must be atomic: two concurrent upserts for the same pair never produce
  /// two rows, and a conditional upsert (`expected_revision`) either applies
  /// in full or returns [`UpsertOutcome::Conflict`] without writing.
  fn upsert_rating(
    &self,
    input: NewRating,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  fn get_rating(
    &self,
    content_id: Uuid,
    rater_id: Uuid,
  ) -> impl Future<Output = Result<Option<Rating>, Self::Error>> + Send + '_;

  /// All ratings for a content item, oldest first.
  fn list_by_content(
    &self,
    content_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Rating>, Self::Error>> + Send + '_;

  /// All ratings by a rater, oldest first.
  fn list_by_rater(
    &self,
    rater_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Rating>, Self::Error>> + Send + '_;

  /// Remove the rating for the pair. Returns `false` if there was none.
  fn delete_rating(
    &self,
    content_id: Uuid,
    rater_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Stats ───────────────────────────────────────────────────────────────────

pub trait StatsStore: Store {
  fn put_stats(
    &self,
    stats: ContentStats,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// `None` means "nobody has rated this content", not an error.
  fn get_stats(
    &self,
    content_id: Uuid,
  ) -> impl Future<Output = Result<Option<ContentStats>, Self::Error>> + Send + '_;

  fn remove_stats(
    &self,
    content_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_stats(
    &self,
  ) -> impl Future<Output = Result<Vec<ContentStats>, Self::Error>> + Send + '_;
}

// ─── Tier lists ──────────────────────────────────────────────────────────────

pub trait TierListStore: Store {
  /// Insert or overwrite the whole list.
  fn save_tier_list<'a>(
    &'a self,
    list: &'a TierList,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn load_tier_list(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TierList>, Self::Error>> + Send + '_;

  fn list_tier_lists(
    &self,
  ) -> impl Future<Output = Result<Vec<TierList>, Self::Error>> + Send + '_;

  fn delete_tier_list(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Convenience bound for a backend that provides every collaborator.
pub trait Backend: RatingStore + StatsStore + TierListStore {}

impl<T> Backend for T where T: RatingStore + StatsStore + TierListStore {}
