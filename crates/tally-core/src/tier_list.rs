//! Manually ordered tier lists.
//!
//! A tier list is a named sequence of buckets, each holding an ordered
//! sequence of item references. Membership is exclusive: an item sits in at
//! most one bucket at a time. Tier lists are driven by explicit user moves,
//! never by rating aggregates.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Key of the reserved bucket for items not yet placed in a tier.
pub const UNRANKED: &str = "unranked";

// ─── Bucket definitions ──────────────────────────────────────────────────────

/// A configured bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDef {
  pub key:   String,
  pub name:  String,
  /// Classifier labels whose items land here when a list is seeded from
  /// ratings.
  #[serde(default)]
  pub tiers: Vec<String>,
}

impl BucketDef {
  pub fn new<const N: usize>(
    key: impl Into<String>,
    name: impl Into<String>,
    tiers: [&str; N],
  ) -> Self {
    Self {
      key:   key.into(),
      name:  name.into(),
      tiers: tiers.iter().map(|t| (*t).to_owned()).collect(),
    }
  }
}

/// The allowed bucket keys, in display order. Always contains [`UNRANKED`].
#[derive(Debug, Clone, Serialize)]
pub struct BucketSet {
  defs: Vec<BucketDef>,
}

impl BucketSet {
  /// Validate `defs`, appending an `unranked` bucket if none was configured.
  pub fn new(mut defs: Vec<BucketDef>) -> Result<Self> {
    let mut seen = HashSet::new();
    for def in &defs {
      if def.key.trim().is_empty() {
        return Err(Error::UnknownBucket(def.key.clone()));
      }
      if !seen.insert(def.key.as_str()) {
        return Err(Error::DuplicateBucket(def.key.clone()));
      }
    }
    if !seen.contains(UNRANKED) {
      defs.push(BucketDef::new(UNRANKED, "待评价", []));
    }
    Ok(Self { defs })
  }

  pub fn defs(&self) -> &[BucketDef] { &self.defs }

  pub fn contains(&self, key: &str) -> bool {
    self.defs.iter().any(|d| d.key == key)
  }

  pub fn check(&self, key: &str) -> Result<()> {
    if self.contains(key) {
      Ok(())
    } else {
      Err(Error::UnknownBucket(key.to_owned()))
    }
  }

  /// The bucket that collects classifier label `tier`, if any.
  pub fn bucket_for_tier(&self, tier: &str) -> Option<&str> {
    self
      .defs
      .iter()
      .find(|d| d.tiers.iter().any(|t| t == tier))
      .map(|d| d.key.as_str())
  }

  /// One empty bucket per definition, in configured order.
  pub fn empty_buckets(&self) -> Vec<Bucket> {
    self.defs.iter().map(|d| Bucket::new(d.key.clone())).collect()
  }
}

impl Default for BucketSet {
  fn default() -> Self {
    Self {
      defs: vec![
        BucketDef::new("s", "夯", ["S"]),
        BucketDef::new("a", "顶级", ["A"]),
        BucketDef::new("b", "人上人", ["B"]),
        BucketDef::new("c", "NPC", ["C"]),
        BucketDef::new("d", "拉完了", ["D", "F"]),
        BucketDef::new(UNRANKED, "待评价", []),
      ],
    }
  }
}

// ─── Tier list ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
  pub key:   String,
  pub items: Vec<String>,
}

impl Bucket {
  pub fn new(key: impl Into<String>) -> Self {
    Self { key: key.into(), items: Vec::new() }
  }

  pub fn with_items<I, T>(key: impl Into<String>, items: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    Self {
      key:   key.into(),
      items: items.into_iter().map(Into::into).collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierList {
  pub tier_list_id: Uuid,
  pub name:         String,
  pub description:  Option<String>,
  /// Bucket order and item order within each bucket are significant.
  pub buckets:      Vec<Bucket>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::engine::Engine::create_tier_list`].
#[derive(Debug, Clone, Default)]
pub struct NewTierList {
  pub name:        String,
  pub description: Option<String>,
  /// Initial buckets; when empty, one empty bucket per configured key.
  pub buckets:     Vec<Bucket>,
}

/// Check that every bucket key is allowed and unique and that no item is
/// placed twice.
pub fn validate_buckets(buckets: &[Bucket], allowed: &BucketSet) -> Result<()> {
  let mut keys = HashSet::new();
  let mut items = HashSet::new();
  for bucket in buckets {
    allowed.check(&bucket.key)?;
    if !keys.insert(bucket.key.as_str()) {
      return Err(Error::DuplicateBucket(bucket.key.clone()));
    }
    for item in &bucket.items {
      if !items.insert(item.as_str()) {
        return Err(Error::DuplicateItem(item.clone()));
      }
    }
  }
  Ok(())
}

impl TierList {
  pub fn new(input: NewTierList, allowed: &BucketSet) -> Result<Self> {
    if input.name.trim().is_empty() {
      return Err(Error::MissingField("name"));
    }
    let buckets = if input.buckets.is_empty() {
      allowed.empty_buckets()
    } else {
      validate_buckets(&input.buckets, allowed)?;
      input.buckets
    };

    let now = Utc::now();
    Ok(Self {
      tier_list_id: Uuid::new_v4(),
      name: input.name,
      description: input.description,
      buckets,
      created_at: now,
      updated_at: now,
    })
  }

  pub fn bucket(&self, key: &str) -> Option<&Bucket> {
    self.buckets.iter().find(|b| b.key == key)
  }

  /// Key of the bucket currently holding `item`.
  pub fn locate(&self, item: &str) -> Option<&str> {
    self
      .buckets
      .iter()
      .find(|b| b.items.iter().any(|i| i == item))
      .map(|b| b.key.as_str())
  }

  fn bucket_mut(&mut self, key: &str) -> &mut Bucket {
    let idx = match self.buckets.iter().position(|b| b.key == key) {
      Some(idx) => idx,
      None => {
        self.buckets.push(Bucket::new(key));
        self.buckets.len() - 1
      }
    };
    &mut self.buckets[idx]
  }

  /// Whole-state replace.
  pub fn replace_buckets(&mut self, buckets: Vec<Bucket>, allowed: &BucketSet) -> Result<()> {
    validate_buckets(&buckets, allowed)?;
    self.buckets = buckets;
    self.updated_at = Utc::now();
    Ok(())
  }

  /// Move `item` from `from` to the end of `to`.
  ///
  /// Returns `false` (and changes nothing) when `item` is not in `from`, so a
  /// retried move is harmless. A configured bucket absent from this list is
  /// created on demand.
  pub fn move_item(
    &mut self,
    item: &str,
    from: &str,
    to: &str,
    allowed: &BucketSet,
  ) -> Result<bool> {
    allowed.check(from)?;
    allowed.check(to)?;

    let Some(source) = self.buckets.iter_mut().find(|b| b.key == from) else {
      return Ok(false);
    };
    let Some(pos) = source.items.iter().position(|i| i == item) else {
      return Ok(false);
    };
    let moved = source.items.remove(pos);
    self.bucket_mut(to).items.push(moved);
    self.updated_at = Utc::now();
    Ok(true)
  }

  /// Append `item` to the unranked bucket unless it is already placed.
  pub fn add_item(&mut self, item: &str) -> Result<bool> {
    if item.trim().is_empty() {
      return Err(Error::MissingField("item"));
    }
    if self.locate(item).is_some() {
      return Ok(false);
    }
    self.bucket_mut(UNRANKED).items.push(item.to_owned());
    self.updated_at = Utc::now();
    Ok(true)
  }

  /// Drop `item` from whichever bucket holds it.
  pub fn remove_item(&mut self, item: &str) -> bool {
    for bucket in &mut self.buckets {
      if let Some(pos) = bucket.items.iter().position(|i| i == item) {
        bucket.items.remove(pos);
        self.updated_at = Utc::now();
        return true;
      }
    }
    false
  }
}
