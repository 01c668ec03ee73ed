use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "SOLARLOG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "solarlog.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the database file. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database: "solarlogging.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub poll_interval_secs: u64,
    pub grace_secs: u64,
    pub chunk_slots: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            grace_secs: 5,
            chunk_slots: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,solar=debug".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub aggregation: AggregationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppConfig {
    /// Load configuration from SOLARLOG_CONFIG path (TOML) if present, with defaults otherwise
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(path)
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        let dir = self
            .storage
            .data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("solarlogging")))
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(&self.storage.database)
    }
}
