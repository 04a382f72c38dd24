//! Handlers for rating endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/ratings` | `?content_id` or `?rater_id` (exactly one) |
//! | `POST`   | `/ratings` | Body: [`SubmitBody`]; 201 on create, 200 on replace |
//! | `GET`    | `/contents/:content_id/ratings/:rater_id` | 404 if absent |
//! | `DELETE` | `/contents/:content_id/ratings/:rater_id` | Returns refreshed stats |

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  engine::Engine,
  rating::{LevelAssignments, NewRating, Rating},
  stats::ContentStats,
  store::Backend,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub content_id: Option<Uuid>,
  pub rater_id:   Option<Uuid>,
}

/// `GET /ratings?content_id=<id>` or `GET /ratings?rater_id=<id>`
pub async fn list<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Rating>>, ApiError> {
  let ratings = match (params.content_id, params.rater_id) {
    (Some(content_id), None) => engine.ratings_for_content(content_id).await?,
    (None, Some(rater_id)) => engine.ratings_by_rater(rater_id).await?,
    _ => {
      return Err(ApiError::BadRequest(
        "exactly one of content_id or rater_id is required".into(),
      ));
    }
  };
  Ok(Json(ratings))
}

// ─── Submit ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /ratings`.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub content_id:        Uuid,
  pub rater_id:          Uuid,
  pub levels:            LevelAssignments,
  pub comment:           Option<String>,
  #[serde(default)]
  pub tags:              BTreeSet<String>,
  /// Optional optimistic-concurrency guard; `0` means "must not exist yet".
  pub expected_revision: Option<u64>,
}

impl From<SubmitBody> for NewRating {
  fn from(b: SubmitBody) -> Self {
    NewRating {
      content_id:        b.content_id,
      rater_id:          b.rater_id,
      levels:            b.levels,
      comment:           b.comment,
      tags:              b.tags,
      expected_revision: b.expected_revision,
    }
  }
}

/// `POST /ratings` — returns the stored rating together with the refreshed
/// stats for its content.
pub async fn submit<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError> {
  let submission = engine.submit_rating(NewRating::from(body)).await?;
  let status = if submission.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(submission)))
}

// ─── Single rating ────────────────────────────────────────────────────────────

/// `GET /contents/:content_id/ratings/:rater_id`
pub async fn get_one<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path((content_id, rater_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Rating>, ApiError> {
  Ok(Json(engine.get_rating(content_id, rater_id).await?))
}

/// `DELETE /contents/:content_id/ratings/:rater_id`
pub async fn delete_one<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path((content_id, rater_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ContentStats>, ApiError> {
  Ok(Json(engine.delete_rating(content_id, rater_id).await?))
}
