//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLWARD_*)
//! 2. TOML config file (if SHELLWARD_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLWARD_*)
/// 2. TOML config file (if SHELLWARD_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the relative manifest paths are resolved against.
    ///
    /// Set via SHELLWARD_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Cache version tag for the current deployment.
    ///
    /// Changing this value is the sole supported mechanism for forcing a
    /// full cache re-population; stores with any other tag are deleted at
    /// activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// App-shell manifest: relative asset paths pre-populated at install.
    ///
    /// Fixed at deploy time; changing the list without bumping
    /// `cache_version` will not re-populate existing stores.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Host substrings exempted from interception entirely.
    ///
    /// Set via SHELLWARD_EXCLUDED_HOSTS environment variable.
    #[serde(default = "default_excluded_hosts")]
    pub excluded_hosts: Vec<String>,

    /// Relative path of the document served as the offline shell.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Path to SQLite store database.
    ///
    /// Set via SHELLWARD_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_origin() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_cache_version() -> String {
    "shell-v1".into()
}

fn default_manifest() -> Vec<String> {
    vec![
        "./".into(),
        "./index.html".into(),
        "./manifest.json".into(),
        "./icon.png".into(),
    ]
}

fn default_excluded_hosts() -> Vec<String> {
    vec!["firebaseio.com".into()]
}

fn default_offline_document() -> String {
    "./index.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellward-store.sqlite")
}

fn default_user_agent() -> String {
    "shellward/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_version: default_cache_version(),
            manifest: default_manifest(),
            excluded_hosts: default_excluded_hosts(),
            offline_document: default_offline_document(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLWARD_`
    /// 2. TOML file from `SHELLWARD_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLWARD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLWARD_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.origin, "http://127.0.0.1:8080");
        assert_eq!(config.cache_version, "shell-v1");
        assert!(config.manifest.contains(&"./index.html".to_string()));
        assert_eq!(config.excluded_hosts, vec!["firebaseio.com".to_string()]);
        assert_eq!(config.offline_document, "./index.html");
        assert_eq!(config.db_path, PathBuf::from("./shellward-store.sqlite"));
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }
}
