//! Read-only aggregate endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/levels` | The configured level vocabulary, in order |
//! | `GET`  | `/contents/:content_id/stats` | Zero state for unrated content |
//! | `GET`  | `/stats` | Totals across all content |
//! | `GET`  | `/tiers` | Rated content grouped by tier of mean score |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use tally_core::{
  engine::{Engine, TierGroup},
  level::Level,
  stats::{ContentStats, Overview},
  store::Backend,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /levels`
pub async fn levels<S: Backend>(State(engine): State<Arc<Engine<S>>>) -> Json<Vec<Level>> {
  Json(engine.levels().to_vec())
}

/// `GET /contents/:content_id/stats`
pub async fn content<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path(content_id): Path<Uuid>,
) -> Result<Json<ContentStats>, ApiError> {
  Ok(Json(engine.get_content_stats(content_id).await?))
}

/// `GET /stats`
pub async fn overview<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<Overview>, ApiError> {
  Ok(Json(engine.overview().await?))
}

/// `GET /tiers`
pub async fn board<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<Vec<TierGroup>>, ApiError> {
  Ok(Json(engine.tier_board().await?))
}
