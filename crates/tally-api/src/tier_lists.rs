//! Handlers for `/tier-lists` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tier-lists` | All lists |
//! | `POST`   | `/tier-lists` | Body: [`CreateBody`]; returns 201 |
//! | `POST`   | `/tier-lists/seed` | Body: [`SeedBody`]; list built from a rater's ratings |
//! | `GET`    | `/tier-lists/:id` | 404 if not found |
//! | `PUT`    | `/tier-lists/:id` | Body: `{"buckets":[...]}`; whole-state replace |
//! | `DELETE` | `/tier-lists/:id` | 204 |
//! | `POST`   | `/tier-lists/:id/move` | Body: [`MoveBody`]; idempotent |
//! | `POST`   | `/tier-lists/:id/items` | Body: `{"item":"..."}`; lands in `unranked` |
//! | `DELETE` | `/tier-lists/:id/items` | Body: `{"item":"..."}`; drops the item from any bucket |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  engine::Engine,
  store::Backend,
  tier_list::{Bucket, NewTierList, TierList},
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List / get ───────────────────────────────────────────────────────────────

/// `GET /tier-lists`
pub async fn list<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<Vec<TierList>>, ApiError> {
  Ok(Json(engine.list_tier_lists().await?))
}

/// `GET /tier-lists/:id`
pub async fn get_one<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<TierList>, ApiError> {
  Ok(Json(engine.get_tier_list(id).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub description: Option<String>,
  #[serde(default)]
  pub buckets:     Vec<Bucket>,
}

/// `POST /tier-lists`
pub async fn create<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let list = engine
    .create_tier_list(NewTierList {
      name:        body.name,
      description: body.description,
      buckets:     body.buckets,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(list)))
}

#[derive(Debug, Deserialize)]
pub struct SeedBody {
  pub name:        String,
  pub description: Option<String>,
  pub rater_id:    Uuid,
}

/// `POST /tier-lists/seed`
pub async fn seed<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<SeedBody>,
) -> Result<impl IntoResponse, ApiError> {
  let list = engine
    .seed_tier_list(body.name, body.description, body.rater_id)
    .await?;
  Ok((StatusCode::CREATED, Json(list)))
}

// ─── Replace / delete ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReplaceBody {
  pub buckets: Vec<Bucket>,
}

/// `PUT /tier-lists/:id`
pub async fn replace<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ReplaceBody>,
) -> Result<Json<TierList>, ApiError> {
  Ok(Json(engine.replace_tier_list_state(id, body.buckets).await?))
}

/// `DELETE /tier-lists/:id`
pub async fn delete_one<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  engine.delete_tier_list(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Items ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MoveBody {
  pub item: String,
  pub from: String,
  pub to:   String,
}

/// `POST /tier-lists/:id/move`
pub async fn move_item<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MoveBody>,
) -> Result<Json<TierList>, ApiError> {
  Ok(Json(
    engine
      .move_tier_item(id, &body.item, &body.from, &body.to)
      .await?,
  ))
}

/// Item references are free text, so they travel in the body rather than
/// the path.
#[derive(Debug, Deserialize)]
pub struct ItemBody {
  pub item: String,
}

/// `POST /tier-lists/:id/items`
pub async fn add_item<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ItemBody>,
) -> Result<Json<TierList>, ApiError> {
  Ok(Json(engine.add_tier_item(id, &body.item).await?))
}

/// `DELETE /tier-lists/:id/items`
pub async fn remove_item<S: Backend>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ItemBody>,
) -> Result<Json<TierList>, ApiError> {
  Ok(Json(engine.remove_tier_item(id, &body.item).await?))
}
