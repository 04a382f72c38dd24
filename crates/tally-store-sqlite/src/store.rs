//! [`SqliteStore`] — the SQLite implementation of the Tally storage traits.

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use tally_core::{
  rating::{NewRating, Rating, UpsertOutcome},
  stats::ContentStats,
  store::{RatingStore, StatsStore, Store, TierListStore},
  tier_list::TierList,
};

use crate::{
  Error, Result,
  encode::{
    RATING_COLUMNS, RawRating, RawStats, RawTierList, encode_buckets, encode_distribution,
    encode_dt, encode_levels, encode_tags, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What the upsert transaction observed, before decoding.
enum RawUpsert {
  Written { raw: RawRating, created: bool },
  Conflict(Option<RawRating>),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema initialised");
    Ok(())
  }

  async fn query_ratings(&self, column: &'static str, id: Uuid) -> Result<Vec<Rating>> {
    let id_str = encode_uuid(id);

    let raws: Vec<RawRating> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RATING_COLUMNS} FROM ratings WHERE {column} = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawRating::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRating::into_rating).collect()
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── RatingStore impl ────────────────────────────────────────────────────────

impl RatingStore for SqliteStore {
  /// Runs as one `IMMEDIATE` transaction: the revision check and the write
  /// cannot interleave with another writer.
  async fn upsert_rating(&self, input: NewRating) -> Result<UpsertOutcome> {
    let new_id_str     = encode_uuid(Uuid::new_v4());
    let content_id_str = encode_uuid(input.content_id);
    let rater_id_str   = encode_uuid(input.rater_id);
    let levels_str     = encode_levels(&input.levels)?;
    let tags_str       = encode_tags(&input.tags)?;
    let now_str        = encode_dt(Utc::now());
    let comment        = input.comment;
    let expected       = input.expected_revision;

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<RawRating> = tx
          .query_row(
            &format!(
              "SELECT {RATING_COLUMNS} FROM ratings WHERE content_id = ?1 AND rater_id = ?2"
            ),
            rusqlite::params![content_id_str, rater_id_str],
            RawRating::from_row,
          )
          .optional()?;

        let current = existing.as_ref().map_or(0, |r| r.revision);
        if let Some(expected) = expected
          && i64::try_from(expected).ok() != Some(current)
        {
          // Dropping `tx` rolls back; nothing was written.
          return Ok(RawUpsert::Conflict(existing));
        }

        tx.execute(
          "INSERT INTO ratings (
             rating_id, content_id, rater_id, levels, comment, tags,
             revision, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
           ON CONFLICT (content_id, rater_id) DO UPDATE SET
             levels     = excluded.levels,
             comment    = excluded.comment,
             tags       = excluded.tags,
             revision   = ratings.revision + 1,
             updated_at = excluded.updated_at",
          rusqlite::params![
            new_id_str,
            content_id_str,
            rater_id_str,
            levels_str,
            comment,
            tags_str,
            now_str,
          ],
        )?;

        let raw = tx.query_row(
          &format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE content_id = ?1 AND rater_id = ?2"
          ),
          rusqlite::params![content_id_str, rater_id_str],
          RawRating::from_row,
        )?;
        tx.commit()?;

        Ok(RawUpsert::Written { raw, created: existing.is_none() })
      })
      .await?;

    Ok(match raw {
      RawUpsert::Written { raw, created: true } => UpsertOutcome::Created(raw.into_rating()?),
      RawUpsert::Written { raw, created: false } => UpsertOutcome::Replaced(raw.into_rating()?),
      RawUpsert::Conflict(current) => {
        UpsertOutcome::Conflict(current.map(RawRating::into_rating).transpose()?)
      }
    })
  }

  async fn get_rating(&self, content_id: Uuid, rater_id: Uuid) -> Result<Option<Rating>> {
    let content_id_str = encode_uuid(content_id);
    let rater_id_str   = encode_uuid(rater_id);

    let raw: Option<RawRating> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RATING_COLUMNS} FROM ratings WHERE content_id = ?1 AND rater_id = ?2"
              ),
              rusqlite::params![content_id_str, rater_id_str],
              RawRating::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRating::into_rating).transpose()
  }

  async fn list_by_content(&self, content_id: Uuid) -> Result<Vec<Rating>> {
    self.query_ratings("content_id", content_id).await
  }

  async fn list_by_rater(&self, rater_id: Uuid) -> Result<Vec<Rating>> {
    self.query_ratings("rater_id", rater_id).await
  }

  async fn delete_rating(&self, content_id: Uuid, rater_id: Uuid) -> Result<bool> {
    let content_id_str = encode_uuid(content_id);
    let rater_id_str   = encode_uuid(rater_id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM ratings WHERE content_id = ?1 AND rater_id = ?2",
          rusqlite::params![content_id_str, rater_id_str],
        )?)
      })
      .await?;

    Ok(n > 0)
  }
}

// ─── StatsStore impl ─────────────────────────────────────────────────────────

impl StatsStore for SqliteStore {
  async fn put_stats(&self, stats: ContentStats) -> Result<()> {
    let content_id_str   = encode_uuid(stats.content_id);
    let distribution_str = encode_distribution(&stats.distribution)?;
    let total_count      = i64::try_from(stats.total_count).map_err(|_| Error::Corrupt {
      column: "content_stats.total_count",
      value:  stats.total_count.to_string(),
    })?;
    let score_sum        = i64::try_from(stats.score_sum).map_err(|_| Error::Corrupt {
      column: "content_stats.score_sum",
      value:  stats.score_sum.to_string(),
    })?;
    let mean_score       = stats.mean_score;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO content_stats (
             content_id, total_count, score_sum, mean_score, distribution
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (content_id) DO UPDATE SET
             total_count  = excluded.total_count,
             score_sum    = excluded.score_sum,
             mean_score   = excluded.mean_score,
             distribution = excluded.distribution",
          rusqlite::params![content_id_str, total_count, score_sum, mean_score, distribution_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_stats(&self, content_id: Uuid) -> Result<Option<ContentStats>> {
    let content_id_str = encode_uuid(content_id);

    let raw: Option<RawStats> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT content_id, total_count, score_sum, mean_score, distribution
               FROM content_stats WHERE content_id = ?1",
              rusqlite::params![content_id_str],
              RawStats::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStats::into_stats).transpose()
  }

  async fn remove_stats(&self, content_id: Uuid) -> Result<()> {
    let content_id_str = encode_uuid(content_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM content_stats WHERE content_id = ?1",
          rusqlite::params![content_id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_stats(&self) -> Result<Vec<ContentStats>> {
    let raws: Vec<RawStats> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT content_id, total_count, score_sum, mean_score, distribution
           FROM content_stats ORDER BY content_id",
        )?;
        let rows = stmt
          .query_map([], RawStats::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStats::into_stats).collect()
  }
}

// ─── TierListStore impl ──────────────────────────────────────────────────────

impl TierListStore for SqliteStore {
  async fn save_tier_list(&self, list: &TierList) -> Result<()> {
    let id_str      = encode_uuid(list.tier_list_id);
    let name        = list.name.clone();
    let description = list.description.clone();
    let buckets_str = encode_buckets(&list.buckets)?;
    let created_str = encode_dt(list.created_at);
    let updated_str = encode_dt(list.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tier_lists (
             tier_list_id, name, description, buckets, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (tier_list_id) DO UPDATE SET
             name        = excluded.name,
             description = excluded.description,
             buckets     = excluded.buckets,
             updated_at  = excluded.updated_at",
          rusqlite::params![id_str, name, description, buckets_str, created_str, updated_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_tier_list(&self, id: Uuid) -> Result<Option<TierList>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTierList> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT tier_list_id, name, description, buckets, created_at, updated_at
               FROM tier_lists WHERE tier_list_id = ?1",
              rusqlite::params![id_str],
              RawTierList::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTierList::into_tier_list).transpose()
  }

  async fn list_tier_lists(&self) -> Result<Vec<TierList>> {
    let raws: Vec<RawTierList> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT tier_list_id, name, description, buckets, created_at, updated_at
           FROM tier_lists ORDER BY created_at, tier_list_id",
        )?;
        let rows = stmt
          .query_map([], RawTierList::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTierList::into_tier_list).collect()
  }

  async fn delete_tier_list(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM tier_lists WHERE tier_list_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(n > 0)
  }
}
