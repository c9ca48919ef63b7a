//! Configuration loading.
//!
//! Config is a YAML file with env-var overrides for deployment secrets
//! (`DATABASE_URL`, `NATS_URL`). Binaries call `dotenv` before loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStatsConfig {
    /// SQLite database path (or `:memory:` for throwaway runs).
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// Which external message source feeds the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Deterministic built-in fixture generator.
    LocalTest,
    /// Bounded backfill replay from a JSONL file of `FatMessage` objects.
    Jsonl,
    /// Live push feed over NATS JetStream.
    Nats,
}

/// Source adapter selection and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,

    /// JSONL file path (`kind: jsonl`).
    #[serde(default)]
    pub path: Option<String>,

    /// NATS server URL (`kind: nats`).
    #[serde(default)]
    pub nats_url: Option<String>,

    /// JetStream stream name (`kind: nats`).
    #[serde(default = "default_stream_name")]
    pub stream_name: String,

    /// Number of fixture messages to emit (`kind: local_test`).
    #[serde(default = "default_message_count")]
    pub message_count: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            path: None,
            nats_url: None,
            stream_name: default_stream_name(),
            message_count: default_message_count(),
        }
    }
}

/// Pipeline worker-pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_stage_parallelism")]
    pub stage_parallelism: usize,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stage_parallelism: default_stage_parallelism(),
            queue_depth: default_queue_depth(),
        }
    }
}

fn default_database_url() -> String {
    "chatstats.db".to_string()
}

fn default_source_kind() -> SourceKind {
    SourceKind::LocalTest
}

fn default_stream_name() -> String {
    "CHAT_MESSAGES".to_string()
}

fn default_message_count() -> usize {
    100
}

fn default_stage_parallelism() -> usize {
    2
}

fn default_queue_depth() -> usize {
    256
}

impl Default for ChatStatsConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            source: SourceConfig::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl ChatStatsConfig {
    /// Load configuration from a YAML file and apply env overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let mut config: ChatStatsConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML: {}", e))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus env overrides, for running without a config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(url) = std::env::var("NATS_URL") {
            self.source.nats_url = Some(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = "
database_url: stats.db
source:
  kind: jsonl
  path: backfill.jsonl
pipeline:
  stage_parallelism: 4
  queue_depth: 128
";
        let config: ChatStatsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database_url, "stats.db");
        assert_eq!(config.source.kind, SourceKind::Jsonl);
        assert_eq!(config.source.path.as_deref(), Some("backfill.jsonl"));
        assert_eq!(config.pipeline.stage_parallelism, 4);
        assert_eq!(config.pipeline.queue_depth, 128);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: ChatStatsConfig = serde_yaml::from_str("database_url: x.db").unwrap();
        assert_eq!(config.source.kind, SourceKind::LocalTest);
        assert_eq!(config.pipeline.stage_parallelism, 2);
        assert_eq!(config.source.stream_name, "CHAT_MESSAGES");
    }
}
