//! Configuration loading and typed config structures for the progression
//! engine.
//!
//! The configuration lives in `cosmolex.yaml`. Every field has a default,
//! so an empty file (or no file at all) yields a working offline setup.
//!
//! ```yaml
//! storage:
//!   data_dir: ./data
//! catalog:
//!   path: ./catalog.yaml
//!   strict: false
//! sync:
//!   dragonfly_url: redis://localhost:6379
//!   interval_secs: 300
//!   push_on_change: true
//! gateway:
//!   host: 127.0.0.1
//!   port: 8090
//!   allow_reset: false
//! logging:
//!   level: info
//!   json: false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level progression engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProgressConfig {
    /// Local durable storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Content catalog source and lookup strictness.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Remote backup and reconciliation.
    #[serde(default)]
    pub sync: SyncConfig,

    /// HTTP/WebSocket gateway.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProgressConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `COSMOLEX_DATA_DIR` overrides `storage.data_dir`
    /// - `DRAGONFLY_URL` overrides `sync.dragonfly_url`
    /// - `COSMOLEX_GATEWAY_PORT` overrides `gateway.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document parses as unit, not as a map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("COSMOLEX_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("DRAGONFLY_URL") {
            self.sync.dragonfly_url = Some(val).filter(|url| !url.is_empty());
        }
        if let Some(val) = lookup("COSMOLEX_GATEWAY_PORT") {
            match val.parse() {
                Ok(port) => self.gateway.port = port,
                Err(e) => tracing::warn!(value = %val, error = %e, "Ignoring invalid COSMOLEX_GATEWAY_PORT"),
            }
        }
    }
}

/// Local storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the per-key record files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Content catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// YAML catalog file. The built-in starter catalog is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Fail loudly on unknown lesson/planet/galaxy references
    /// (development). When `false`, such calls are logged no-ops.
    #[serde(default)]
    pub strict: bool,
}

/// Remote sync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Dragonfly (Redis-compatible) URL. Sync runs offline when unset.
    #[serde(default)]
    pub dragonfly_url: Option<String>,

    /// Seconds between background sync rounds (0 disables the timer).
    #[serde(default = "default_sync_interval_secs")]
    pub interval_secs: u64,

    /// Start a sync round after every local change to stars or planets.
    #[serde(default = "default_true")]
    pub push_on_change: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dragonfly_url: None,
            interval_secs: default_sync_interval_secs(),
            push_on_change: true,
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayConfig {
    /// Bind address.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Expose `POST /api/reset`.
    #[serde(default)]
    pub allow_reset: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            allow_reset: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

const fn default_sync_interval_secs() -> u64 {
    300
}

const fn default_true() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_gateway_port() -> u16 {
    8090
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse_without_env(yaml: &str) -> ProgressConfig {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn defaults_are_offline_and_lenient() {
        let config = ProgressConfig::default();
        assert!(config.sync.dragonfly_url.is_none());
        assert!(!config.catalog.strict);
        assert!(!config.gateway.allow_reset);
        assert_eq!(config.gateway.port, 8090);
        assert_eq!(config.sync.interval_secs, 300);
        assert!(config.sync.push_on_change);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = parse_without_env(
            r"
catalog:
  strict: true
gateway:
  port: 9000
",
        );
        assert!(config.catalog.strict);
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn overrides_replace_yaml_values() {
        let mut config = parse_without_env("sync:\n  dragonfly_url: redis://a:6379\n");
        config.apply_overrides(|name| match name {
            "COSMOLEX_DATA_DIR" => Some("/tmp/cosmolex".to_owned()),
            "DRAGONFLY_URL" => Some("redis://b:6379".to_owned()),
            "COSMOLEX_GATEWAY_PORT" => Some("7000".to_owned()),
            _ => None,
        });
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/cosmolex"));
        assert_eq!(config.sync.dragonfly_url.as_deref(), Some("redis://b:6379"));
        assert_eq!(config.gateway.port, 7000);
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut config = ProgressConfig::default();
        config.apply_overrides(|name| {
            (name == "COSMOLEX_GATEWAY_PORT").then(|| "not-a-port".to_owned())
        });
        assert_eq!(config.gateway.port, 8090);
    }

    #[test]
    fn empty_dragonfly_override_disables_remote() {
        let mut config = parse_without_env("sync:\n  dragonfly_url: redis://a:6379\n");
        config.apply_overrides(|name| (name == "DRAGONFLY_URL").then(String::new));
        assert!(config.sync.dragonfly_url.is_none());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cosmolex-config.yaml");
        std::fs::write(&path, "logging:\n  json: true\n").unwrap();
        let config = ProgressConfig::from_file(&path).unwrap();
        assert!(config.logging.json);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProgressConfig::from_file(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
