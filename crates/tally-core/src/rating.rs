//! Rating types — one rater's level assignments for one content item.
//!
//! At most one [`Rating`] exists per `(content_id, rater_id)` pair. A second
//! submission replaces the first in place: identity and `created_at` survive,
//! everything else is overwritten and `revision` is bumped.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, level::LevelRegistry};

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// A rated aspect of a content item. Every dimension draws its level from
/// the same registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
  Overall,
  Technical,
  Creativity,
  Execution,
  Impact,
}

/// The level keys a rater assigned. `overall` is mandatory; it alone feeds
/// the aggregate statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelAssignments {
  pub overall:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub technical:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub creativity: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execution:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub impact:     Option<String>,
}

impl LevelAssignments {
  pub fn overall(key: impl Into<String>) -> Self {
    Self {
      overall:    key.into(),
      technical:  None,
      creativity: None,
      execution:  None,
      impact:     None,
    }
  }

  /// Every assigned `(dimension, level key)` pair, overall first.
  pub fn iter(&self) -> impl Iterator<Item = (Dimension, &str)> {
    [
      (Dimension::Overall, Some(&self.overall)),
      (Dimension::Technical, self.technical.as_ref()),
      (Dimension::Creativity, self.creativity.as_ref()),
      (Dimension::Execution, self.execution.as_ref()),
      (Dimension::Impact, self.impact.as_ref()),
    ]
    .into_iter()
    .filter_map(|(d, k)| k.map(|k| (d, k.as_str())))
  }

  /// Reject blank or unregistered keys in any dimension.
  pub fn validate(&self, registry: &LevelRegistry) -> Result<()> {
    if self.overall.trim().is_empty() {
      return Err(Error::MissingField("levels.overall"));
    }
    for (_, key) in self.iter() {
      if !registry.is_valid_level(key) {
        return Err(Error::UnknownLevel(key.to_owned()));
      }
    }
    Ok(())
  }
}

// ─── Rating ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
  pub rating_id:  Uuid,
  pub content_id: Uuid,
  pub rater_id:   Uuid,
  pub levels:     LevelAssignments,
  pub comment:    Option<String>,
  pub tags:       BTreeSet<String>,
  /// Incremented by the store on every replace; starts at 1.
  pub revision:   u64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ─── NewRating ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RatingStore::upsert_rating`]. Identity and
/// timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewRating {
  pub content_id:        Uuid,
  pub rater_id:          Uuid,
  pub levels:            LevelAssignments,
  pub comment:           Option<String>,
  pub tags:              BTreeSet<String>,
  /// When set, the write only applies if the stored rating is still at this
  /// revision (`0` meaning "no rating yet"). `None` is last-write-wins.
  pub expected_revision: Option<u64>,
}

impl NewRating {
  pub fn new(content_id: Uuid, rater_id: Uuid, levels: LevelAssignments) -> Self {
    Self {
      content_id,
      rater_id,
      levels,
      comment: None,
      tags: BTreeSet::new(),
      expected_revision: None,
    }
  }
}

/// Result of an upsert as decided by the store.
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
  Created(Rating),
  Replaced(Rating),
  /// `expected_revision` did not match; nothing was written. Holds the
  /// rating as it currently stands (if any).
  Conflict(Option<Rating>),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn iter_skips_unassigned_dimensions() {
    let mut levels = LevelAssignments::overall("ding");
    levels.impact = Some("la".into());
    let pairs: Vec<_> = levels.iter().collect();
    assert_eq!(pairs, [(Dimension::Overall, "ding"), (Dimension::Impact, "la")]);
  }

  #[test]
  fn validate_rejects_unknown_secondary_level() {
    let reg = LevelRegistry::seven_point();
    let mut levels = LevelAssignments::overall("jia");
    assert!(levels.validate(&reg).is_ok());

    levels.creativity = Some("mythic".into());
    assert!(matches!(levels.validate(&reg), Err(Error::UnknownLevel(k)) if k == "mythic"));
  }

  #[test]
  fn validate_rejects_blank_overall() {
    let reg = LevelRegistry::seven_point();
    let levels = LevelAssignments::overall("  ");
    assert!(matches!(levels.validate(&reg), Err(Error::MissingField(_))));
  }
}
