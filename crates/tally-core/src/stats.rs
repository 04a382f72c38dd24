//! Per-content aggregate statistics.
//!
//! [`ContentStats`] is a materialised view: it is always exactly what
//! [`aggregate`] returns for the content's current ratings, and nothing else
//! writes it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, level::LevelRegistry, rating::Rating};

/// Aggregate over the overall level of every rating for one content item.
///
/// The distribution is sparse: only level keys observed at least once appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStats {
  pub content_id:   Uuid,
  pub total_count:  u64,
  /// Exact sum of overall scores; `mean_score` is derived from it.
  pub score_sum:    u64,
  /// Arithmetic mean of overall scores; `0.0` when `total_count == 0`.
  pub mean_score:   f64,
  pub distribution: BTreeMap<String, u64>,
}

impl ContentStats {
  /// The state of a content item nobody has rated.
  pub fn zero(content_id: Uuid) -> Self {
    Self {
      content_id,
      total_count: 0,
      score_sum: 0,
      mean_score: 0.0,
      distribution: BTreeMap::new(),
    }
  }

  pub fn is_empty(&self) -> bool { self.total_count == 0 }
}

/// Recompute stats for `content_id` from scratch.
///
/// Fails with [`Error::InvalidLevelReference`] if any rating's overall level
/// is missing from `registry`; no partial result is produced.
pub fn aggregate(
  content_id: Uuid,
  ratings: &[Rating],
  registry: &LevelRegistry,
) -> Result<ContentStats> {
  if ratings.is_empty() {
    return Ok(ContentStats::zero(content_id));
  }

  let mut sum: u64 = 0;
  let mut distribution: BTreeMap<String, u64> = BTreeMap::new();

  for rating in ratings {
    let key = rating.levels.overall.as_str();
    let score = registry
      .score_of(key)
      .map_err(|_| Error::InvalidLevelReference {
        content_id,
        level: key.to_owned(),
      })?;
    sum += u64::from(score);
    *distribution.entry(key.to_owned()).or_default() += 1;
  }

  let total_count = ratings.len() as u64;
  Ok(ContentStats {
    content_id,
    total_count,
    score_sum: sum,
    mean_score: sum as f64 / total_count as f64,
    distribution,
  })
}

// ─── Overview ────────────────────────────────────────────────────────────────

/// Totals across every rated content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
  pub total_ratings:  u64,
  pub rated_contents: u64,
  /// Mean over all ratings (not a mean of means); `0.0` when empty.
  pub mean_score:     f64,
}

impl Overview {
  pub fn from_stats<'a>(stats: impl IntoIterator<Item = &'a ContentStats>) -> Self {
    let mut total_ratings = 0u64;
    let mut rated_contents = 0u64;
    let mut score_sum = 0u64;

    for s in stats.into_iter().filter(|s| !s.is_empty()) {
      total_ratings += s.total_count;
      rated_contents += 1;
      score_sum += s.score_sum;
    }

    let mean_score = if total_ratings == 0 {
      0.0
    } else {
      score_sum as f64 / total_ratings as f64
    };

    Self { total_ratings, rated_contents, mean_score }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use chrono::Utc;

  use super::*;
  use crate::rating::LevelAssignments;

  fn rating(content_id: Uuid, level: &str) -> Rating {
    let now = Utc::now();
    Rating {
      rating_id: Uuid::new_v4(),
      content_id,
      rater_id: Uuid::new_v4(),
      levels: LevelAssignments::overall(level),
      comment: None,
      tags: BTreeSet::new(),
      revision: 1,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn empty_input_is_zero_state() {
    let id = Uuid::new_v4();
    let stats = aggregate(id, &[], &LevelRegistry::seven_point()).unwrap();
    assert_eq!(stats, ContentStats::zero(id));
  }

  #[test]
  fn mean_count_and_distribution() {
    let id = Uuid::new_v4();
    let ratings = [rating(id, "ding"), rating(id, "jia"), rating(id, "zhong")];
    let stats = aggregate(id, &ratings, &LevelRegistry::seven_point()).unwrap();

    assert_eq!(stats.total_count, 3);
    assert_eq!(stats.score_sum, 15);
    assert_eq!(stats.mean_score, 5.0);
    assert_eq!(
      stats.distribution,
      BTreeMap::from([("ding".into(), 1), ("jia".into(), 1), ("zhong".into(), 1)])
    );
  }

  #[test]
  fn repeated_levels_accumulate() {
    let id = Uuid::new_v4();
    let ratings = [rating(id, "la"), rating(id, "la"), rating(id, "hang")];
    let stats = aggregate(id, &ratings, &LevelRegistry::seven_point()).unwrap();

    assert_eq!(stats.distribution.get("la"), Some(&2));
    assert_eq!(stats.distribution.get("hang"), Some(&1));
    assert!((stats.mean_score - 4.0 / 3.0).abs() < f64::EPSILON);
  }

  #[test]
  fn unregistered_level_aborts() {
    let id = Uuid::new_v4();
    let ratings = [rating(id, "ding"), rating(id, "retired")];
    let err = aggregate(id, &ratings, &LevelRegistry::seven_point()).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidLevelReference { level, .. } if level == "retired"
    ));
  }

  #[test]
  fn aggregate_is_idempotent() {
    let id = Uuid::new_v4();
    let reg = LevelRegistry::seven_point();
    let ratings = [rating(id, "shang"), rating(id, "renshang")];
    let a = serde_json::to_string(&aggregate(id, &ratings, &reg).unwrap()).unwrap();
    let b = serde_json::to_string(&aggregate(id, &ratings, &reg).unwrap()).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn overview_weights_by_count() {
    let a = ContentStats {
      content_id:   Uuid::new_v4(),
      total_count:  3,
      score_sum:    18,
      mean_score:   6.0,
      distribution: BTreeMap::new(),
    };
    let b = ContentStats {
      content_id:   Uuid::new_v4(),
      total_count:  1,
      score_sum:    2,
      mean_score:   2.0,
      distribution: BTreeMap::new(),
    };
    let overview = Overview::from_stats([&a, &b]);
    assert_eq!(overview.total_ratings, 4);
    assert_eq!(overview.rated_contents, 2);
    assert_eq!(overview.mean_score, 5.0);

    let empty = Overview::from_stats(std::iter::empty());
    assert_eq!(empty.mean_score, 0.0);
  }

  #[test]
  fn overview_uses_exact_sums() {
    let id_a = Uuid::new_v4();
    let id_b = Uuid::new_v4();
    let reg = LevelRegistry::seven_point();
    // Means of 13/3 and 11/3 are not exact in binary floating point.
    let a = aggregate(id_a, &[rating(id_a, "ding"), rating(id_a, "jia"), rating(id_a, "la")], &reg)
      .unwrap();
    let b =
      aggregate(id_b, &[rating(id_b, "ding"), rating(id_b, "hang"), rating(id_b, "hang")], &reg)
        .unwrap();
    assert_eq!(a.score_sum, 13);
    assert_eq!(b.score_sum, 11);

    let overview = Overview::from_stats([&a, &b]);
    assert_eq!(overview.total_ratings, 6);
    assert_eq!(overview.mean_score, 24.0 / 6.0);
  }
}
