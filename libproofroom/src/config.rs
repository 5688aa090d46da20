//! Configuration management for Proofroom

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::storage::BackendKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the studio's REST API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout applied by the HTTP client.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry budget for idempotent reads. Writes are never retried.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend override. When absent the backend is picked for the
    /// platform at process start: OS keychain where available, file otherwise.
    #[serde(default)]
    pub backend: Option<BackendKind>,

    /// Path of the file backend's secrets file (`~` expanded).
    #[serde(default = "default_secrets_path")]
    pub file_path: String,
}

fn default_base_url() -> String {
    "https://api.proofroom.example".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_secrets_path() -> String {
    "~/.config/proofroom/secrets.json".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: None,
            file_path: default_secrets_path(),
        }
    }
}

impl StorageConfig {
    /// Expand `~` and environment variables in the secrets file path.
    pub fn expanded_file_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.file_path).to_string())
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing config file is not an error: the defaults apply.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PROOFROOM_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("proofroom").join("config.toml"))
}
