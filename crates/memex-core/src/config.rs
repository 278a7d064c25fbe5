//! Top-level Memex configuration.
//!
//! Loaded from a YAML file via `serde_yaml`, then overlaid with
//! `MEMEX__`-prefixed environment variables via the `config` crate, the
//! same two-stage discipline the teacher's server config uses. See
//! SPEC_FULL.md §6.4.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to overlay environment: {0}")]
    Env(#[from] config::ConfigError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Recognized configuration fields (SPEC_FULL §6.4). No other environment
/// input alters behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemexConfig {
    #[serde(default = "MemexConfig::default_capture_interval_seconds")]
    pub capture_interval_seconds: u64,

    #[serde(default = "MemexConfig::default_record_dir")]
    pub record_dir: PathBuf,

    /// Path to the embedded redb database file backing the vector index
    /// (the spec's `index_endpoint`, repurposed for an embedded backend).
    #[serde(default = "MemexConfig::default_index_endpoint")]
    pub index_endpoint: PathBuf,

    /// Logical namespace prefix for the embedded index's keys.
    #[serde(default = "MemexConfig::default_index_collection")]
    pub index_collection: String,

    #[serde(default = "MemexConfig::default_embedding_dim")]
    pub embedding_dim: usize,

    #[serde(default = "MemexConfig::default_log_level")]
    pub log_level: String,

    /// `host:port` for the HTTP transport, or the literal `"stdio"`.
    #[serde(default = "MemexConfig::default_tool_service_endpoint")]
    pub tool_service_endpoint: String,
}

impl MemexConfig {
    pub fn default_capture_interval_seconds() -> u64 {
        60
    }

    pub fn default_record_dir() -> PathBuf {
        PathBuf::from("./memex-data/records")
    }

    pub fn default_index_endpoint() -> PathBuf {
        PathBuf::from("./memex-data/index.redb")
    }

    pub fn default_index_collection() -> String {
        "memex".to_string()
    }

    pub fn default_embedding_dim() -> usize {
        384
    }

    pub fn default_log_level() -> String {
        "info".to_string()
    }

    pub fn default_tool_service_endpoint() -> String {
        "stdio".to_string()
    }

    /// Load from a YAML file, then overlay `MEMEX__FIELD` environment
    /// variables, then validate.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigLoadError> {
        let file_value: Self = serde_yaml::from_str(raw)?;

        let layered = config::Config::builder()
            .add_source(config::Config::try_from(&file_value)?)
            .add_source(
                config::Environment::with_prefix("MEMEX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = layered.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.capture_interval_seconds == 0 {
            return Err(ConfigLoadError::Invalid(
                "capture_interval_seconds must be > 0".into(),
            ));
        }
        if self.record_dir.as_os_str().is_empty() {
            return Err(ConfigLoadError::Invalid(
                "record_dir must not be empty".into(),
            ));
        }
        if self.embedding_dim == 0 {
            return Err(ConfigLoadError::Invalid(
                "embedding_dim must be > 0".into(),
            ));
        }
        if parse_log_level(&self.log_level).is_none() {
            return Err(ConfigLoadError::Invalid(format!(
                "log_level `{}` is not recognized",
                self.log_level
            )));
        }
        if self.tool_service_endpoint != "stdio" && self.tool_service_endpoint.parse::<std::net::SocketAddr>().is_err()
        {
            return Err(ConfigLoadError::Invalid(format!(
                "tool_service_endpoint `{}` must be `stdio` or a host:port address",
                self.tool_service_endpoint
            )));
        }
        Ok(())
    }
}

impl Default for MemexConfig {
    fn default() -> Self {
        Self {
            capture_interval_seconds: Self::default_capture_interval_seconds(),
            record_dir: Self::default_record_dir(),
            index_endpoint: Self::default_index_endpoint(),
            index_collection: Self::default_index_collection(),
            embedding_dim: Self::default_embedding_dim(),
            log_level: Self::default_log_level(),
            tool_service_endpoint: Self::default_tool_service_endpoint(),
        }
    }
}

fn parse_log_level(level: &str) -> Option<tracing::Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}
