//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tally_core::engine::{Engine, EngineConfig};
use tally_store_sqlite::SqliteStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  api_router(Arc::new(Engine::new(Arc::new(store), EngineConfig::default())))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn submit_body(content: Uuid, rater: Uuid, level: &str) -> Value {
  json!({
    "content_id": content,
    "rater_id": rater,
    "levels": { "overall": level },
  })
}

// ── Ratings ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_returns_rating_and_stats() {
  let app = app().await;
  let (content, rater) = (Uuid::new_v4(), Uuid::new_v4());

  let (status, body) = call(&app, "POST", "/ratings", Some(submit_body(content, rater, "zhong"))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["stats"]["total_count"], 1);

  let (status, body) = call(&app, "POST", "/ratings", Some(submit_body(content, rater, "shang"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["rating"]["revision"], 2);
  assert_eq!(body["stats"]["mean_score"], 4.0);

  let (status, body) = call(&app, "GET", &format!("/contents/{content}/stats"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total_count"], 1);
  assert_eq!(body["distribution"], json!({ "shang": 1 }));
}

#[tokio::test]
async fn unknown_level_is_400() {
  let app = app().await;
  let (status, body) = call(
    &app,
    "POST",
    "/ratings",
    Some(submit_body(Uuid::new_v4(), Uuid::new_v4(), "legendary")),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("legendary"));
}

#[tokio::test]
async fn stale_revision_is_409() {
  let app = app().await;
  let (content, rater) = (Uuid::new_v4(), Uuid::new_v4());
  call(&app, "POST", "/ratings", Some(submit_body(content, rater, "jia"))).await;

  let mut body = submit_body(content, rater, "la");
  body["expected_revision"] = json!(0);
  let (status, _) = call(&app, "POST", "/ratings", Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unrated_content_stats_are_zero() {
  let app = app().await;
  let (status, body) = call(&app, "GET", &format!("/contents/{}/stats", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total_count"], 0);
  assert_eq!(body["mean_score"], 0.0);
}

#[tokio::test]
async fn list_requires_exactly_one_filter() {
  let app = app().await;
  let (status, _) = call(&app, "GET", "/ratings", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let rater = Uuid::new_v4();
  call(&app, "POST", "/ratings", Some(submit_body(Uuid::new_v4(), rater, "ding"))).await;
  let (status, body) = call(&app, "GET", &format!("/ratings?rater_id={rater}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_rating_then_404() {
  let app = app().await;
  let (content, rater) = (Uuid::new_v4(), Uuid::new_v4());
  call(&app, "POST", "/ratings", Some(submit_body(content, rater, "ding"))).await;

  let uri = format!("/contents/{content}/ratings/{rater}");
  let (status, body) = call(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total_count"], 0);

  let (status, _) = call(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn levels_and_board_are_exposed() {
  let app = app().await;
  let (_, levels) = call(&app, "GET", "/levels", None).await;
  assert_eq!(levels.as_array().unwrap().len(), 7);
  assert_eq!(levels[0]["key"], "la");

  let (status, board) = call(&app, "GET", "/tiers", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(board.as_array().unwrap().len(), 6);
}

// ── Tier lists ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn tier_list_lifecycle() {
  let app = app().await;
  let (status, list) = call(&app, "POST", "/tier-lists", Some(json!({ "name": "Fruit" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  let id = list["tier_list_id"].as_str().unwrap().to_owned();

  call(&app, "POST", &format!("/tier-lists/{id}/items"), Some(json!({ "item": "A" }))).await;
  let mv = json!({ "item": "A", "from": "unranked", "to": "s" });
  call(&app, "POST", &format!("/tier-lists/{id}/move"), Some(mv)).await;
  let mv = json!({ "item": "A", "from": "s", "to": "a" });
  let (status, list) = call(&app, "POST", &format!("/tier-lists/{id}/move"), Some(mv)).await;
  assert_eq!(status, StatusCode::OK);

  let buckets = list["buckets"].as_array().unwrap();
  let holding: Vec<_> = buckets
    .iter()
    .filter(|b| b["items"].as_array().unwrap().contains(&json!("A")))
    .map(|b| b["key"].as_str().unwrap())
    .collect();
  assert_eq!(holding, ["a"]);

  let (status, _) = call(&app, "DELETE", &format!("/tier-lists/{id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&app, "GET", &format!("/tier-lists/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn items_with_slashes_can_be_added_and_removed() {
  let app = app().await;
  let (_, list) = call(&app, "POST", "/tier-lists", Some(json!({ "name": "Paths" }))).await;
  let id = list["tier_list_id"].as_str().unwrap().to_owned();
  let uri = format!("/tier-lists/{id}/items");

  let (status, list) = call(&app, "POST", &uri, Some(json!({ "item": "games/zelda" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(list.to_string().contains("games/zelda"));

  let (status, list) = call(&app, "DELETE", &uri, Some(json!({ "item": "games/zelda" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(!list.to_string().contains("games/zelda"));
}

#[tokio::test]
async fn replace_with_unknown_bucket_is_400() {
  let app = app().await;
  let (_, list) = call(&app, "POST", "/tier-lists", Some(json!({ "name": "Cars" }))).await;
  let id = list["tier_list_id"].as_str().unwrap().to_owned();

  let snapshot = json!({ "buckets": [{ "key": "z", "items": ["x"] }] });
  let (status, _) = call(&app, "PUT", &format!("/tier-lists/{id}"), Some(snapshot)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let snapshot = json!({ "buckets": [
    { "key": "b", "items": ["2", "1"] },
    { "key": "unranked", "items": ["3"] },
  ]});
  let (status, list) = call(&app, "PUT", &format!("/tier-lists/{id}"), Some(snapshot)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list["buckets"][0]["items"], json!(["2", "1"]));
}
