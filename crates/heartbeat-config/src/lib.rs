//! heartbeat-config -- layered runtime configuration.
//!
//! Precedence (highest to lowest), mirroring the teacher's
//! `otlp2parquet-config::apply_env_overrides` layering:
//! 1. Environment variables (unprefixed names from spec §6, e.g. `QUEUE_URL`)
//! 2. An optional TOML file, pointed to by `HEARTBEAT_CONFIG`
//! 3. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Abstraction over environment-variable lookups so config loading is
/// testable without mutating the real process environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from the real process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub url: String,
    pub queue_key: String,
    pub processing_key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            queue_key: "heartbeat:queue".to_string(),
            processing_key: "heartbeat:processing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub archive_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            archive_dir: "archive".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    pub max_batch: usize,
    pub max_batch_time_secs: f64,
    pub brpop_timeout_secs: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_batch: 400,
            max_batch_time_secs: 5.0,
            brpop_timeout_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompactorConfig {
    pub sleep_seconds: u64,
    pub min_parts_to_compact: usize,
}

impl Default for CompactorConfig {
    fn default() -> Self {
        Self {
            sleep_seconds: 300,
            min_parts_to_compact: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
    #[serde(default)]
    pub compactor: CompactorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl RuntimeConfig {
    /// Loads defaults, then an optional TOML file (if `HEARTBEAT_CONFIG`
    /// points at one), then applies environment-variable overrides.
    pub fn load() -> Result<Self> {
        Self::load_from_env(&ProcessEnv)
    }

    pub fn load_from_env<E: EnvSource>(env: &E) -> Result<Self> {
        let mut config = if let Some(path) = env.get("HEARTBEAT_CONFIG") {
            Self::load_from_path(Path::new(&path))
                .with_context(|| format!("failed to load config from {path}"))?
        } else {
            Self::default()
        };
        apply_env_overrides(&mut config, env)?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    if let Some(v) = env.get("QUEUE_URL") {
        config.queue.url = v;
    }
    if let Some(v) = env.get("QUEUE_KEY") {
        config.queue.queue_key = v;
    }
    if let Some(v) = env.get("PROCESSING_KEY") {
        config.queue.processing_key = v;
    }
    if let Some(v) = env.get("DATA_DIR") {
        config.storage.data_dir = v;
    }
    if let Some(v) = env.get("ARCHIVE_DIR") {
        config.storage.archive_dir = v;
    }
    if let Some(v) = env.get("MAX_BATCH") {
        config.consumer.max_batch = v.parse().context("MAX_BATCH must be an integer")?;
    }
    if let Some(v) = env.get("MAX_BATCH_TIME") {
        config.consumer.max_batch_time_secs =
            v.parse().context("MAX_BATCH_TIME must be a number")?;
    }
    if let Some(v) = env.get("BRPOP_TIMEOUT") {
        config.consumer.brpop_timeout_secs = v.parse().context("BRPOP_TIMEOUT must be an integer")?;
    }
    if let Some(v) = env.get("COMPACT_SLEEP_SECONDS") {
        config.compactor.sleep_seconds = v
            .parse()
            .context("COMPACT_SLEEP_SECONDS must be an integer")?;
    }
    if let Some(v) = env.get("MIN_PARTS_TO_COMPACT") {
        config.compactor.min_parts_to_compact = v
            .parse()
            .context("MIN_PARTS_TO_COMPACT must be an integer")?;
    }
    if let Some(v) = env.get("LOG_LEVEL") {
        config.server.log_level = v;
    }
    if let Some(v) = env.get("HEARTBEAT_LOG_FORMAT") {
        config.server.log_format = match v.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }
    if let Some(v) = env.get("LISTEN_ADDR") {
        config.server.listen_addr = v;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|s| s.to_string())
        }
    }

    #[test]
    fn defaults_match_spec() {
        let config = RuntimeConfig::default();
        assert_eq!(config.consumer.max_batch, 400);
        assert_eq!(config.consumer.max_batch_time_secs, 5.0);
        assert_eq!(config.consumer.brpop_timeout_secs, 1);
        assert_eq!(config.compactor.sleep_seconds, 300);
        assert_eq!(config.compactor.min_parts_to_compact, 5);
        assert_eq!(config.queue.queue_key, "heartbeat:queue");
        assert_eq!(config.queue.processing_key, "heartbeat:processing");
    }

    #[test]
    fn env_overrides_win_over_defaults() {
        let env = MapEnv(HashMap::from([("MAX_BATCH", "50"), ("DATA_DIR", "/tmp/hb")]));
        let config = RuntimeConfig::load_from_env(&env).unwrap();
        assert_eq!(config.consumer.max_batch, 50);
        assert_eq!(config.storage.data_dir, "/tmp/hb");
        // untouched keys keep their defaults
        assert_eq!(config.compactor.sleep_seconds, 300);
    }

    #[test]
    fn invalid_numeric_env_is_an_error() {
        let env = MapEnv(HashMap::from([("MAX_BATCH", "not-a-number")]));
        assert!(RuntimeConfig::load_from_env(&env).is_err());
    }
}
