//! Score-threshold tier classification.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, level::LevelRegistry};

/// A single classifier row: scores at or above `min_score` get `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
  pub min_score: f64,
  pub label:     String,
}

impl Threshold {
  pub fn new(min_score: f64, label: impl Into<String>) -> Self {
    Self { min_score, label: label.into() }
  }
}

/// Maps a continuous score to a coarse tier label.
///
/// Thresholds are held most-selective-first; the first one the score reaches
/// wins, and scores below all of them get the fallback label.
#[derive(Debug, Clone)]
pub struct TierClassifier {
  thresholds: Vec<Threshold>,
  fallback:   String,
}

impl TierClassifier {
  /// Thresholds must be finite and strictly decreasing, and every label
  /// (the fallback included) must be distinct.
  pub fn new(thresholds: Vec<Threshold>, fallback: impl Into<String>) -> Result<Self> {
    for t in &thresholds {
      if !t.min_score.is_finite() {
        return Err(Error::InvalidThresholds(format!(
          "threshold for {:?} is not a finite number",
          t.label
        )));
      }
    }
    if let Some(pair) = thresholds
      .windows(2)
      .find(|w| w[1].min_score >= w[0].min_score)
    {
      return Err(Error::InvalidThresholds(format!(
        "{:?} ({}) must be below {:?} ({})",
        pair[1].label, pair[1].min_score, pair[0].label, pair[0].min_score
      )));
    }

    let fallback = fallback.into();
    let mut seen = HashSet::new();
    for label in thresholds.iter().map(|t| t.label.as_str()).chain([fallback.as_str()]) {
      if !seen.insert(label) {
        return Err(Error::InvalidThresholds(format!("label {label:?} is used twice")));
      }
    }

    Ok(Self { thresholds, fallback })
  }

  /// Table for the seven-point registry:
  /// `S ≥ 6.5 > A ≥ 5.5 > B ≥ 4.5 > C ≥ 3.5 > D ≥ 2.5 > F`.
  pub fn seven_point() -> Self {
    Self::letters([6.5, 5.5, 4.5, 3.5, 2.5])
  }

  /// Table for scores on a ten-point scale:
  /// `S ≥ 9 > A ≥ 8 > B ≥ 7 > C ≥ 6 > D ≥ 5 > F`.
  pub fn ten_point() -> Self {
    Self::letters([9.0, 8.0, 7.0, 6.0, 5.0])
  }

  fn letters(mins: [f64; 5]) -> Self {
    Self {
      thresholds: mins
        .into_iter()
        .zip(["S", "A", "B", "C", "D"])
        .map(|(min, label)| Threshold::new(min, label))
        .collect(),
      fallback:   "F".into(),
    }
  }

  pub fn classify(&self, score: f64) -> &str {
    self
      .thresholds
      .iter()
      .find(|t| score >= t.min_score)
      .map_or(self.fallback.as_str(), |t| t.label.as_str())
  }

  /// Tier for a single raw level assignment: the level's own tier label if
  /// it has one, else its score run through [`Self::classify`].
  pub fn classify_raw_level<'a>(
    &'a self,
    registry: &'a LevelRegistry,
    key: &str,
  ) -> Result<&'a str> {
    let level = registry.lookup(key)?;
    Ok(match &level.tier_label {
      Some(label) => label.as_str(),
      None => self.classify(f64::from(level.score)),
    })
  }

  /// Every label this classifier can produce, in descending order, ending
  /// with the fallback.
  pub fn labels(&self) -> impl Iterator<Item = &str> {
    self
      .thresholds
      .iter()
      .map(|t| t.label.as_str())
      .chain(std::iter::once(self.fallback.as_str()))
  }

  pub fn thresholds(&self) -> &[Threshold] { &self.thresholds }

  pub fn fallback(&self) -> &str { &self.fallback }
}

/// Matches the default [`LevelRegistry`].
impl Default for TierClassifier {
  fn default() -> Self { Self::seven_point() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::level::Level;

  #[test]
  fn ten_point_table_boundaries() {
    let c = TierClassifier::ten_point();
    assert_eq!(c.classify(9.5), "S");
    assert_eq!(c.classify(9.0), "S");
    assert_eq!(c.classify(8.0), "A");
    assert_eq!(c.classify(7.999), "B");
    assert_eq!(c.classify(5.0), "D");
    assert_eq!(c.classify(4.9), "F");
    assert_eq!(c.classify(-3.0), "F");
  }

  #[test]
  fn custom_table_for_seven_point_scale() {
    let c = TierClassifier::new(
      vec![Threshold::new(6.5, "S"), Threshold::new(5.0, "A"), Threshold::new(3.0, "B")],
      "C",
    )
    .unwrap();
    assert_eq!(c.classify(7.0), "S");
    assert_eq!(c.classify(5.0), "A");
    assert_eq!(c.classify(2.99), "C");
    assert_eq!(c.labels().collect::<Vec<_>>(), ["S", "A", "B", "C"]);
  }

  #[test]
  fn rejects_non_decreasing_thresholds() {
    let err = TierClassifier::new(vec![Threshold::new(5.0, "A"), Threshold::new(5.0, "B")], "F")
      .unwrap_err();
    assert!(matches!(err, Error::InvalidThresholds(_)));

    assert!(TierClassifier::new(vec![Threshold::new(f64::NAN, "A")], "F").is_err());
  }

  #[test]
  fn default_table_spans_seven_point_registry() {
    let c = TierClassifier::default();
    let reg = LevelRegistry::seven_point();
    let tiers: Vec<_> = reg
      .all_levels()
      .iter()
      .map(|l| c.classify(f64::from(l.score)))
      .collect();
    assert_eq!(tiers, ["F", "F", "D", "C", "B", "A", "S"]);
    assert_eq!(c.classify(6.5), "S");
    assert_eq!(c.classify(6.49), "A");
  }

  #[test]
  fn rejects_duplicate_labels() {
    let err = TierClassifier::new(vec![Threshold::new(5.0, "S"), Threshold::new(3.0, "S")], "F")
      .unwrap_err();
    assert!(matches!(err, Error::InvalidThresholds(_)));

    let err = TierClassifier::new(vec![Threshold::new(5.0, "S")], "S").unwrap_err();
    assert!(matches!(err, Error::InvalidThresholds(_)));
  }

  #[test]
  fn empty_table_always_falls_back() {
    let c = TierClassifier::new(Vec::new(), "all").unwrap();
    assert_eq!(c.classify(100.0), "all");
  }

  #[test]
  fn raw_level_prefers_configured_label() {
    let reg = LevelRegistry::new(vec![
      Level::new("top", "Top", 10).with_tier("S级"),
      Level::new("mid", "Mid", 8),
    ])
    .unwrap();
    let c = TierClassifier::ten_point();
    assert_eq!(c.classify_raw_level(&reg, "top").unwrap(), "S级");
    assert_eq!(c.classify_raw_level(&reg, "mid").unwrap(), "A");
    assert!(matches!(c.classify_raw_level(&reg, "nope"), Err(Error::UnknownLevel(_))));
  }
}
