//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields (level
//! assignments, tags, distributions, buckets) are stored as compact JSON.
//! UUIDs are stored as hyphenated lowercase strings.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tally_core::{
  rating::{LevelAssignments, Rating},
  stats::ContentStats,
  tier_list::{Bucket, TierList},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_levels(levels: &LevelAssignments) -> Result<String> {
  Ok(serde_json::to_string(levels)?)
}

pub fn encode_tags(tags: &BTreeSet<String>) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn encode_distribution(d: &BTreeMap<String, u64>) -> Result<String> {
  Ok(serde_json::to_string(d)?)
}

pub fn encode_buckets(buckets: &[Bucket]) -> Result<String> {
  Ok(serde_json::to_string(buckets)?)
}

fn decode_count(column: &'static str, v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::Corrupt { column, value: v.to_string() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `ratings` row.
pub struct RawRating {
  pub rating_id:  String,
  pub content_id: String,
  pub rater_id:   String,
  pub levels:     String,
  pub comment:    Option<String>,
  pub tags:       String,
  pub revision:   i64,
  pub created_at: String,
  pub updated_at: String,
}

/// Column list matching the field order of [`RawRating::from_row`].
pub const RATING_COLUMNS: &str = "rating_id, content_id, rater_id, levels, comment, tags, \
                                  revision, created_at, updated_at";

impl RawRating {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rating_id:  row.get(0)?,
      content_id: row.get(1)?,
      rater_id:   row.get(2)?,
      levels:     row.get(3)?,
      comment:    row.get(4)?,
      tags:       row.get(5)?,
      revision:   row.get(6)?,
      created_at: row.get(7)?,
      updated_at: row.get(8)?,
    })
  }

  pub fn into_rating(self) -> Result<Rating> {
    Ok(Rating {
      rating_id:  decode_uuid(&self.rating_id)?,
      content_id: decode_uuid(&self.content_id)?,
      rater_id:   decode_uuid(&self.rater_id)?,
      levels:     serde_json::from_str(&self.levels)?,
      comment:    self.comment,
      tags:       serde_json::from_str(&self.tags)?,
      revision:   decode_count("ratings.revision", self.revision)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `content_stats` row.
pub struct RawStats {
  pub content_id:   String,
  pub total_count:  i64,
  pub score_sum:    i64,
  pub mean_score:   f64,
  pub distribution: String,
}

impl RawStats {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      content_id:   row.get(0)?,
      total_count:  row.get(1)?,
      score_sum:    row.get(2)?,
      mean_score:   row.get(3)?,
      distribution: row.get(4)?,
    })
  }

  pub fn into_stats(self) -> Result<ContentStats> {
    Ok(ContentStats {
      content_id:   decode_uuid(&self.content_id)?,
      total_count:  decode_count("content_stats.total_count", self.total_count)?,
      score_sum:    decode_count("content_stats.score_sum", self.score_sum)?,
      mean_score:   self.mean_score,
      distribution: serde_json::from_str(&self.distribution)?,
    })
  }
}

/// Raw values read directly from a `tier_lists` row.
pub struct RawTierList {
  pub tier_list_id: String,
  pub name:         String,
  pub description:  Option<String>,
  pub buckets:      String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawTierList {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tier_list_id: row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      buckets:      row.get(3)?,
      created_at:   row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }

  pub fn into_tier_list(self) -> Result<TierList> {
    Ok(TierList {
      tier_list_id: decode_uuid(&self.tier_list_id)?,
      name:         self.name,
      description:  self.description,
      buckets:      serde_json::from_str(&self.buckets)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}
