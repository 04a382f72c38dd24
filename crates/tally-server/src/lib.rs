//! Server wiring for Tally: configuration, engine construction, and the
//! top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use serde::Deserialize;
use tally_core::{
  classify::{Threshold, TierClassifier},
  engine::{Engine, EngineConfig},
  level::{Level, LevelRegistry},
  store::Backend,
  tier_list::{BucketDef, BucketSet},
};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TALLY_*` environment variables.
///
/// The vocabulary sections are optional; each one that is absent falls back
/// to the built-in default independently.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  #[serde(default)]
  pub levels:         Option<Vec<Level>>,
  #[serde(default)]
  pub thresholds:     Option<Vec<Threshold>>,
  #[serde(default)]
  pub fallback_label: Option<String>,
  #[serde(default)]
  pub buckets:        Option<Vec<BucketDef>>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("tally.db") }

impl ServerConfig {
  /// Load from an optional TOML file layered under the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("TALLY"))
      .build()?
      .try_deserialize()
  }

  /// Validate the vocabulary sections and build the engine configuration.
  pub fn engine_config(&self) -> tally_core::Result<EngineConfig> {
    let registry = match &self.levels {
      Some(levels) => LevelRegistry::new(levels.clone())?,
      None => LevelRegistry::default(),
    };

    let classifier = match (&self.thresholds, &self.fallback_label) {
      (None, None) => TierClassifier::default(),
      (thresholds, fallback) => {
        let defaults = TierClassifier::default();
        TierClassifier::new(
          thresholds
            .clone()
            .unwrap_or_else(|| defaults.thresholds().to_vec()),
          fallback
            .clone()
            .unwrap_or_else(|| defaults.fallback().to_owned()),
        )?
      }
    };

    let buckets = match &self.buckets {
      Some(defs) => BucketSet::new(defs.clone())?,
      None => BucketSet::default(),
    };

    Ok(EngineConfig { registry, classifier, buckets })
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API mounted under `/api`, with request tracing.
pub fn router<S>(engine: Arc<Engine<S>>) -> Router
where
  S: Backend + 'static,
{
  Router::new()
    .nest("/api", tally_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.port, 3000);
    let engine = cfg.engine_config().unwrap();
    assert_eq!(engine.registry.all_levels().len(), 7);
    assert_eq!(engine.classifier.classify(7.0), "S");
    assert_eq!(engine.classifier.classify(5.5), "A");
    assert!(engine.buckets.contains("unranked"));
  }

  #[test]
  fn custom_vocabulary() {
    let cfg = parse(
      r#"
        port = 8080
        fallback_label = "meh"

        [[levels]]
        key = "no"
        name = "No"
        score = 1

        [[levels]]
        key = "yes"
        name = "Yes"
        score = 2
        tier_label = "good"

        [[thresholds]]
        min_score = 1.5
        label = "good"

        [[buckets]]
        key = "keep"
        name = "Keep"
        tiers = ["good"]
      "#,
    );
    let engine = cfg.engine_config().unwrap();
    assert_eq!(engine.registry.score_of("yes").unwrap(), 2);
    assert_eq!(engine.classifier.classify(1.0), "meh");
    assert_eq!(engine.buckets.bucket_for_tier("good"), Some("keep"));
    assert!(engine.buckets.contains("unranked"));
  }

  #[test]
  fn increasing_thresholds_are_rejected() {
    let cfg = parse(
      r#"
        [[thresholds]]
        min_score = 1.0
        label = "low"

        [[thresholds]]
        min_score = 2.0
        label = "high"
      "#,
    );
    assert!(matches!(
      cfg.engine_config(),
      Err(tally_core::Error::InvalidThresholds(_))
    ));
  }

  #[test]
  fn threshold_label_clashing_with_fallback_is_rejected() {
    let cfg = parse(
      r#"
        fallback_label = "F"

        [[thresholds]]
        min_score = 4.0
        label = "F"
      "#,
    );
    assert!(matches!(
      cfg.engine_config(),
      Err(tally_core::Error::InvalidThresholds(_))
    ));
  }

  #[test]
  fn tilde_expansion() {
    let plain = Path::new("/var/lib/tally.db");
    assert_eq!(expand_tilde(plain), plain);
  }
}
