//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per (content, rater). Replaced in place on resubmission.
CREATE TABLE IF NOT EXISTS ratings (
    rating_id   TEXT PRIMARY KEY,
    content_id  TEXT NOT NULL,
    rater_id    TEXT NOT NULL,
    levels      TEXT NOT NULL,              -- JSON LevelAssignments
    comment     TEXT,
    tags        TEXT NOT NULL DEFAULT '[]', -- JSON array, sorted
    revision    INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,              -- ISO 8601 UTC
    updated_at  TEXT NOT NULL,
    UNIQUE (content_id, rater_id)
);

-- Materialised per-content aggregate; absent means zero ratings.
CREATE TABLE IF NOT EXISTS content_stats (
    content_id    TEXT PRIMARY KEY,
    total_count   INTEGER NOT NULL,
    score_sum     INTEGER NOT NULL,
    mean_score    REAL NOT NULL,
    distribution  TEXT NOT NULL             -- JSON object level -> count
);

CREATE TABLE IF NOT EXISTS tier_lists (
    tier_list_id  TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    description   TEXT,
    buckets       TEXT NOT NULL,            -- JSON array, order significant
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ratings_content_idx ON ratings(content_id);
CREATE INDEX IF NOT EXISTS ratings_rater_idx   ON ratings(rater_id);

PRAGMA user_version = 1;
";
