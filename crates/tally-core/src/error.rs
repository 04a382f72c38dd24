//! Error types for `tally-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  // ── Validation ──────────────────────────────────────────────────────────
  #[error("unknown level key: {0:?}")]
  UnknownLevel(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("unknown bucket key: {0:?}")]
  UnknownBucket(String),

  #[error("bucket {0:?} appears more than once")]
  DuplicateBucket(String),

  #[error("item {0:?} is placed in more than one bucket")]
  DuplicateItem(String),

  #[error("invalid level registry: {0}")]
  InvalidRegistry(String),

  #[error("invalid tier thresholds: {0}")]
  InvalidThresholds(String),

  // ── Not found ───────────────────────────────────────────────────────────
  #[error("no rating by rater {rater_id} for content {content_id}")]
  RatingNotFound { content_id: Uuid, rater_id: Uuid },

  #[error("tier list not found: {0}")]
  TierListNotFound(Uuid),

  // ── Concurrency ─────────────────────────────────────────────────────────
  /// Another submission by the same rater committed first. `current_revision`
  /// is the revision that won.
  #[error(
    "rating by rater {rater_id} for content {content_id} was replaced \
     concurrently (now at revision {current_revision})"
  )]
  ConflictLost {
    content_id:       Uuid,
    rater_id:         Uuid,
    current_revision: u64,
  },

  // ── Integrity ───────────────────────────────────────────────────────────
  /// A stored rating references a level key that the registry does not know.
  #[error("content {content_id} has a rating with unregistered level {level:?}")]
  InvalidLevelReference { content_id: Uuid, level: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification of an [`Error`], used by outer layers to pick a
/// status signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Conflict,
  Integrity,
  Store,
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UnknownLevel(_)
      | Self::MissingField(_)
      | Self::UnknownBucket(_)
      | Self::DuplicateBucket(_)
      | Self::DuplicateItem(_)
      | Self::InvalidRegistry(_)
      | Self::InvalidThresholds(_) => ErrorKind::Validation,
      Self::RatingNotFound { .. } | Self::TierListNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::ConflictLost { .. } => ErrorKind::Conflict,
      Self::InvalidLevelReference { .. } => ErrorKind::Integrity,
      Self::Store(_) => ErrorKind::Store,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
