use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the custom code service base URL
pub const API_URL_ENV_VAR: &str = "STYLE_MERGER_API_URL";

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Settings for the custom code registration service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCodeConfig {
    /// Base URL of the service, without a trailing slash
    pub base_url: String,

    /// Page ids per status request
    pub status_batch_size: usize,

    /// Page ids per application status lookup
    pub pages_per_request: usize,
}

impl Default for CustomCodeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            status_batch_size: 5,
            pages_per_request: 10,
        }
    }
}

/// Configuration for the style merge tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of styles returned by a prefix search
    pub search_limit: usize,

    /// Per-call timeout for Designer API calls in milliseconds (None = wait forever)
    pub host_timeout_ms: Option<u64>,

    /// Whether to undo element repoints of a duplicate whose merge failed
    pub rollback_on_failure: bool,

    /// Name shown for styles whose name could not be resolved
    pub unnamed_style_placeholder: String,

    /// Custom code service settings
    pub custom_code: CustomCodeConfig,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_limit: 20,
            host_timeout_ms: Some(10_000),
            rollback_on_failure: true,
            unnamed_style_placeholder: "Unnamed Style".to_string(),
            custom_code: CustomCodeConfig::default(),
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply overrides from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                self.custom_code.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        self
    }

    /// Per-call host timeout
    pub fn host_timeout(&self) -> Option<Duration> {
        self.host_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.search_limit == 0 {
            return Err(Error::Configuration(
                "Search limit must be greater than zero".to_string(),
            ));
        }

        if self.host_timeout_ms == Some(0) {
            return Err(Error::Configuration(
                "Host timeout must be greater than zero; omit it to disable".to_string(),
            ));
        }

        if self.custom_code.status_batch_size == 0 || self.custom_code.pages_per_request == 0 {
            return Err(Error::Configuration(
                "Custom code batch sizes must be greater than zero".to_string(),
            ));
        }

        if self.custom_code.base_url.trim().is_empty() {
            return Err(Error::Configuration(
                "Custom code base URL must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search_limit, 20);
        assert_eq!(config.host_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let config = Config {
            search_limit: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = Config::default();
        config.custom_code.status_batch_size = 0;
        assert!(config.validate().is_err());

        let config = Config {
            host_timeout_ms: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("style-merger.json");

        let config = Config {
            search_limit: 5,
            rollback_on_failure: false,
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"search_limit": 3}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.search_limit, 3);
        assert_eq!(config.unnamed_style_placeholder, "Unnamed Style");
    }
}
