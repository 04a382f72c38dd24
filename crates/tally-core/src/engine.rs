//! [`Engine`] — the entry point for every inbound call.
//!
//! Each mutation runs to completion before returning: a rating write is
//! followed by a recompute-and-persist of that content's stats, so callers
//! never see a rating without matching stats.

use std::{
  collections::BTreeSet,
  hash::{DefaultHasher, Hash, Hasher},
  sync::Arc,
};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  classify::TierClassifier,
  level::{Level, LevelRegistry},
  rating::{NewRating, Rating, UpsertOutcome},
  stats::{ContentStats, Overview, aggregate},
  store::Backend,
  tier_list::{Bucket, BucketSet, NewTierList, TierList, UNRANKED},
};

/// Number of lock stripes guarding stats recomputation.
const STATS_STRIPES: usize = 64;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Deployment-time vocabulary. Built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
  pub registry:   LevelRegistry,
  pub classifier: TierClassifier,
  pub buckets:    BucketSet,
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// The outcome of [`Engine::submit_rating`].
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
  pub rating:  Rating,
  pub stats:   ContentStats,
  /// `false` when an existing rating by the same rater was replaced.
  pub created: bool,
}

/// Contents whose mean score falls into one classifier tier.
#[derive(Debug, Clone, Serialize)]
pub struct TierGroup {
  pub label:    String,
  /// Highest mean first.
  pub contents: Vec<ContentStats>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct Engine<S> {
  store:       Arc<S>,
  config:      EngineConfig,
  stats_locks: Vec<Mutex<()>>,
}

impl<S: Backend> Engine<S> {
  pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
    Self {
      store,
      config,
      stats_locks: (0..STATS_STRIPES).map(|_| Mutex::new(())).collect(),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn registry(&self) -> &LevelRegistry { &self.config.registry }

  pub fn classifier(&self) -> &TierClassifier { &self.config.classifier }

  pub fn buckets(&self) -> &BucketSet { &self.config.buckets }

  pub fn levels(&self) -> &[Level] { self.config.registry.all_levels() }

  fn stats_lock(&self, content_id: Uuid) -> &Mutex<()> {
    let mut hasher = DefaultHasher::new();
    content_id.hash(&mut hasher);
    &self.stats_locks[hasher.finish() as usize % STATS_STRIPES]
  }

  // ── Ratings ───────────────────────────────────────────────────────────────

  /// Validate, upsert, then refresh the content's stats.
  pub async fn submit_rating(&self, mut input: NewRating) -> Result<Submission> {
    input.levels.validate(&self.config.registry)?;
    input.comment = input
      .comment
      .map(|c| c.trim().to_owned())
      .filter(|c| !c.is_empty());
    input.tags = input
      .tags
      .into_iter()
      .map(|t| t.trim().to_owned())
      .filter(|t| !t.is_empty())
      .collect::<BTreeSet<_>>();

    let (content_id, rater_id) = (input.content_id, input.rater_id);
    let outcome = self
      .store
      .upsert_rating(input)
      .await
      .map_err(Error::store)?;

    let (rating, created) = match outcome {
      UpsertOutcome::Created(r) => (r, true),
      UpsertOutcome::Replaced(r) => (r, false),
      UpsertOutcome::Conflict(current) => {
        let current_revision = current.map_or(0, |r| r.revision);
        warn!(%content_id, %rater_id, current_revision, "rating upsert lost a race");
        return Err(Error::ConflictLost { content_id, rater_id, current_revision });
      }
    };

    info!(
      %content_id,
      %rater_id,
      level = %rating.levels.overall,
      revision = rating.revision,
      created,
      "rating stored"
    );

    let stats = self.refresh_stats(content_id).await?;
    Ok(Submission { rating, stats, created })
  }

  /// Remove a rating and refresh the content's stats.
  pub async fn delete_rating(&self, content_id: Uuid, rater_id: Uuid) -> Result<ContentStats> {
    let deleted = self
      .store
      .delete_rating(content_id, rater_id)
      .await
      .map_err(Error::store)?;
    if !deleted {
      return Err(Error::RatingNotFound { content_id, rater_id });
    }
    info!(%content_id, %rater_id, "rating deleted");
    self.refresh_stats(content_id).await
  }

  pub async fn get_rating(&self, content_id: Uuid, rater_id: Uuid) -> Result<Rating> {
    self
      .store
      .get_rating(content_id, rater_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::RatingNotFound { content_id, rater_id })
  }

  pub async fn ratings_for_content(&self, content_id: Uuid) -> Result<Vec<Rating>> {
    self.store.list_by_content(content_id).await.map_err(Error::store)
  }

  pub async fn ratings_by_rater(&self, rater_id: Uuid) -> Result<Vec<Rating>> {
    self.store.list_by_rater(rater_id).await.map_err(Error::store)
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  /// Compute stats from the stored ratings without persisting them.
  pub async fn recompute(&self, content_id: Uuid) -> Result<ContentStats> {
    let ratings = self
      .store
      .list_by_content(content_id)
      .await
      .map_err(Error::store)?;
    let stats = aggregate(content_id, &ratings, &self.config.registry).inspect_err(|e| {
      warn!(%content_id, error = %e, "stats recomputation aborted");
    })?;
    debug!(
      %content_id,
      count = stats.total_count,
      mean = stats.mean_score,
      "stats recomputed"
    );
    Ok(stats)
  }

  /// Recompute and persist. Zero-rating content has its stats row removed.
  ///
  /// Serialised per content so the last write always reflects every rating
  /// committed before it started.
  pub async fn refresh_stats(&self, content_id: Uuid) -> Result<ContentStats> {
    let _guard = self.stats_lock(content_id).lock().await;

    let stats = self.recompute(content_id).await?;
    if stats.is_empty() {
      self.store.remove_stats(content_id).await.map_err(Error::store)?;
    } else {
      self.store.put_stats(stats.clone()).await.map_err(Error::store)?;
    }
    Ok(stats)
  }

  /// Cached stats; content nobody has rated yields the zero state.
  pub async fn get_content_stats(&self, content_id: Uuid) -> Result<ContentStats> {
    Ok(
      self
        .store
        .get_stats(content_id)
        .await
        .map_err(Error::store)?
        .unwrap_or_else(|| ContentStats::zero(content_id)),
    )
  }

  pub async fn overview(&self) -> Result<Overview> {
    let all = self.store.list_stats().await.map_err(Error::store)?;
    Ok(Overview::from_stats(&all))
  }

  /// Every rated content grouped by the tier of its mean score, in
  /// classifier order with the fallback group last.
  pub async fn tier_board(&self) -> Result<Vec<TierGroup>> {
    let all = self.store.list_stats().await.map_err(Error::store)?;
    let classifier = &self.config.classifier;

    let mut groups: Vec<TierGroup> = classifier
      .labels()
      .map(|label| TierGroup { label: label.to_owned(), contents: Vec::new() })
      .collect();

    for stats in all.into_iter().filter(|s| !s.is_empty()) {
      let label = classifier.classify(stats.mean_score);
      if let Some(group) = groups.iter_mut().find(|g| g.label == label) {
        group.contents.push(stats);
      }
    }
    for group in &mut groups {
      group.contents.sort_by(|a, b| {
        b.mean_score
          .total_cmp(&a.mean_score)
          .then_with(|| a.content_id.cmp(&b.content_id))
      });
    }
    Ok(groups)
  }

  // ── Tier lists ────────────────────────────────────────────────────────────

  pub async fn create_tier_list(&self, input: NewTierList) -> Result<TierList> {
    let list = TierList::new(input, &self.config.buckets)?;
    self.save(&list).await?;
    info!(tier_list_id = %list.tier_list_id, name = %list.name, "tier list created");
    Ok(list)
  }

  /// Build a list from a rater's ratings: each content id goes to the bucket
  /// that collects the tier of its overall level, or to `unranked`.
  pub async fn seed_tier_list(
    &self,
    name: String,
    description: Option<String>,
    rater_id: Uuid,
  ) -> Result<TierList> {
    let ratings = self.ratings_by_rater(rater_id).await?;
    let allowed = &self.config.buckets;
    let mut buckets = allowed.empty_buckets();

    for rating in &ratings {
      let tier = self
        .config
        .classifier
        .classify_raw_level(&self.config.registry, &rating.levels.overall)
        .map_err(|_| Error::InvalidLevelReference {
          content_id: rating.content_id,
          level:      rating.levels.overall.clone(),
        })?;
      let key = allowed.bucket_for_tier(tier).unwrap_or(UNRANKED);
      if let Some(bucket) = buckets.iter_mut().find(|b| b.key == key) {
        bucket.items.push(rating.content_id.to_string());
      }
    }

    self
      .create_tier_list(NewTierList { name, description, buckets })
      .await
  }

  pub async fn get_tier_list(&self, id: Uuid) -> Result<TierList> {
    self
      .store
      .load_tier_list(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::TierListNotFound(id))
  }

  pub async fn list_tier_lists(&self) -> Result<Vec<TierList>> {
    self.store.list_tier_lists().await.map_err(Error::store)
  }

  /// Whole-state replace, as persisted after a drag-and-drop session.
  pub async fn replace_tier_list_state(&self, id: Uuid, buckets: Vec<Bucket>) -> Result<TierList> {
    let mut list = self.get_tier_list(id).await?;
    list.replace_buckets(buckets, &self.config.buckets)?;
    self.save(&list).await?;
    debug!(tier_list_id = %id, "tier list replaced");
    Ok(list)
  }

  /// Move one item. Retrying a completed move changes nothing.
  pub async fn move_tier_item(
    &self,
    id: Uuid,
    item: &str,
    from: &str,
    to: &str,
  ) -> Result<TierList> {
    let mut list = self.get_tier_list(id).await?;
    if list.move_item(item, from, to, &self.config.buckets)? {
      self.save(&list).await?;
      debug!(tier_list_id = %id, item, from, to, "tier item moved");
    } else {
      debug!(tier_list_id = %id, item, from, "tier item not in source bucket; nothing to move");
    }
    Ok(list)
  }

  /// Append an item to the unranked bucket unless it is already placed.
  pub async fn add_tier_item(&self, id: Uuid, item: &str) -> Result<TierList> {
    let mut list = self.get_tier_list(id).await?;
    if list.add_item(item)? {
      self.save(&list).await?;
    }
    Ok(list)
  }

  pub async fn remove_tier_item(&self, id: Uuid, item: &str) -> Result<TierList> {
    let mut list = self.get_tier_list(id).await?;
    if list.remove_item(item) {
      self.save(&list).await?;
    }
    Ok(list)
  }

  pub async fn delete_tier_list(&self, id: Uuid) -> Result<()> {
    let deleted = self.store.delete_tier_list(id).await.map_err(Error::store)?;
    if !deleted {
      return Err(Error::TierListNotFound(id));
    }
    info!(tier_list_id = %id, "tier list deleted");
    Ok(())
  }

  async fn save(&self, list: &TierList) -> Result<()> {
    self.store.save_tier_list(list).await.map_err(Error::store)
  }
}
