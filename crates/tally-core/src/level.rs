//! The level registry — the ordered catalogue of qualitative rating choices.
//!
//! A registry is built once from configuration and never mutated afterwards.
//! Every level key that arrives from outside the process must be checked
//! against it before it reaches the aggregation code.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Level ───────────────────────────────────────────────────────────────────

/// One qualitative rating choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
  /// Stable identifier stored in ratings, e.g. `"ding"`.
  pub key:         String,
  /// Human-readable name, e.g. `"顶"`.
  pub name:        String,
  /// Ordinal score; always positive.
  pub score:       u32,
  #[serde(default)]
  pub description: Option<String>,
  /// Display tier label (e.g. `"S"`), used when grouping raw assignments.
  #[serde(default)]
  pub tier_label:  Option<String>,
}

impl Level {
  pub fn new(key: impl Into<String>, name: impl Into<String>, score: u32) -> Self {
    Self {
      key: key.into(),
      name: name.into(),
      score,
      description: None,
      tier_label: None,
    }
  }

  pub fn with_tier(mut self, label: impl Into<String>) -> Self {
    self.tier_label = Some(label.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Ordered, immutable set of [`Level`]s. Insertion order is display order.
#[derive(Debug, Clone)]
pub struct LevelRegistry {
  levels: Vec<Level>,
  index:  HashMap<String, usize>,
}

impl LevelRegistry {
  /// Build a registry, rejecting empty input, duplicate keys and zero scores.
  pub fn new(levels: Vec<Level>) -> Result<Self> {
    if levels.is_empty() {
      return Err(Error::InvalidRegistry("no levels configured".into()));
    }

    let mut index = HashMap::with_capacity(levels.len());
    for (i, level) in levels.iter().enumerate() {
      if level.key.trim().is_empty() {
        return Err(Error::InvalidRegistry(format!("level #{i} has an empty key")));
      }
      if level.score == 0 {
        return Err(Error::InvalidRegistry(format!(
          "level {:?} must have a positive score",
          level.key
        )));
      }
      if index.insert(level.key.clone(), i).is_some() {
        return Err(Error::InvalidRegistry(format!(
          "duplicate level key {:?}",
          level.key
        )));
      }
    }

    Ok(Self { levels, index })
  }

  /// The seven-step vocabulary, scored 1 through 7.
  pub fn seven_point() -> Self {
    Self::from_builtin(vec![
      Level::new("la", "拉", 1).with_tier("F"),
      Level::new("hang", "夯", 2).with_tier("F"),
      Level::new("zhong", "中", 3).with_tier("D"),
      Level::new("shang", "上", 4).with_tier("C"),
      Level::new("jia", "佳", 5).with_tier("B"),
      Level::new("renshang", "人上人", 6).with_tier("A"),
      Level::new("ding", "顶", 7).with_tier("S"),
    ])
  }

  /// A five-step vocabulary, scored 1 through 5.
  pub fn five_point() -> Self {
    Self::from_builtin(vec![
      Level::new("poor", "Poor", 1).with_tier("D"),
      Level::new("fair", "Fair", 2).with_tier("C"),
      Level::new("good", "Good", 3).with_tier("B"),
      Level::new("great", "Great", 4).with_tier("A"),
      Level::new("excellent", "Excellent", 5).with_tier("S"),
    ])
  }

  fn from_builtin(levels: Vec<Level>) -> Self {
    let index = levels
      .iter()
      .enumerate()
      .map(|(i, l)| (l.key.clone(), i))
      .collect();
    Self { levels, index }
  }

  pub fn lookup(&self, key: &str) -> Result<&Level> {
    self
      .index
      .get(key)
      .map(|&i| &self.levels[i])
      .ok_or_else(|| Error::UnknownLevel(key.to_owned()))
  }

  pub fn all_levels(&self) -> &[Level] { &self.levels }

  pub fn score_of(&self, key: &str) -> Result<u32> {
    self.lookup(key).map(|l| l.score)
  }

  pub fn is_valid_level(&self, key: &str) -> bool { self.index.contains_key(key) }
}

impl Default for LevelRegistry {
  fn default() -> Self { Self::seven_point() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_known_and_unknown() {
    let reg = LevelRegistry::seven_point();
    assert_eq!(reg.score_of("ding").unwrap(), 7);
    assert_eq!(reg.lookup("zhong").unwrap().name, "中");
    assert!(reg.is_valid_level("la"));
    assert!(!reg.is_valid_level("legendary"));
    assert!(matches!(reg.score_of("legendary"), Err(Error::UnknownLevel(k)) if k == "legendary"));
  }

  #[test]
  fn all_levels_keeps_insertion_order() {
    let reg = LevelRegistry::new(vec![
      Level::new("b", "B", 2),
      Level::new("a", "A", 1),
      Level::new("c", "C", 3),
    ])
    .unwrap();
    let keys: Vec<_> = reg.all_levels().iter().map(|l| l.key.as_str()).collect();
    assert_eq!(keys, ["b", "a", "c"]);
  }

  #[test]
  fn rejects_duplicate_keys() {
    let err = LevelRegistry::new(vec![Level::new("a", "A", 1), Level::new("a", "A2", 2)])
      .unwrap_err();
    assert!(matches!(err, Error::InvalidRegistry(_)));
  }

  #[test]
  fn rejects_zero_score_and_empty() {
    assert!(LevelRegistry::new(vec![Level::new("a", "A", 0)]).is_err());
    assert!(LevelRegistry::new(Vec::new()).is_err());
  }

  #[test]
  fn deserialises_from_config_shape() {
    let levels: Vec<Level> = serde_json::from_str(
      r#"[{"key":"x","name":"X","score":3,"tier_label":"S级"}]"#,
    )
    .unwrap();
    let reg = LevelRegistry::new(levels).unwrap();
    assert_eq!(reg.lookup("x").unwrap().tier_label.as_deref(), Some("S级"));
    assert_eq!(reg.lookup("x").unwrap().description, None);
  }
}
