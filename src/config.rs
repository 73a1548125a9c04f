//! Configuration for the anchor session daemon
//!
//! Loads configuration from a TOML file. Every section has defaults so a
//! partial file (or none at all) still yields a runnable setup.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Persistent storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the anchor history blob
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "anchor-storage".to_string(),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Tick rate in Hz for the session loop
    pub tick_hz: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_hz: 30.0 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = basic_toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = basic_toml::to_string(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.path, "anchor-storage");
        assert_eq!(config.scheduler.tick_hz, 30.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[storage]
path = "/var/lib/anchors"

[scheduler]
tick_hz = 10.0

[logging]
level = "debug"
"#;

        let config: AppConfig = basic_toml::from_str(toml_content).unwrap();
        assert_eq!(config.storage.path, "/var/lib/anchors");
        assert_eq!(config.scheduler.tick_hz, 10.0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_file_round_trip() {
        let path = std::env::temp_dir().join("sthira_test_config.toml");
        let _ = std::fs::remove_file(&path);

        let mut config = AppConfig::default();
        config.logging.level = "warn".to_string();
        config.scheduler.tick_hz = 10.0;
        config.to_file(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.logging.level, "warn");
        assert_eq!(loaded.scheduler.tick_hz, 10.0);
        assert_eq!(loaded.storage.path, "anchor-storage");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let toml_content = r#"
[logging]
level = "trace"
"#;

        let config: AppConfig = basic_toml::from_str(toml_content).unwrap();
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.storage.path, "anchor-storage");
        assert_eq!(config.scheduler.tick_hz, 30.0);
    }
}
