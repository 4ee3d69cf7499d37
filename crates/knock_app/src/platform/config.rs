//! Application configuration loaded from `knock.ron`.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use knock_client::{ClientSettings, DEFAULT_BASE_URL};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "knock.ron";
pub const SERVER_URL_ENV: &str = "KNOCK_SERVER_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub session_file: PathBuf,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            session_file: PathBuf::from(".knock_session.ron"),
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `knock.ron` from `dir` and applies the environment override.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(&dir.join(CONFIG_FILENAME))?;
        config.apply_server_override(std::env::var(SERVER_URL_ENV).ok());
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_server_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|url| !url.trim().is_empty()) {
            self.server_url = url.trim().to_string();
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.server_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server_url, "http://localhost:3000");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            "(server_url: \"https://api.example.test\", log_destination: both)",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server_url, "https://api.example.test");
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "(server_url: ").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_override_replaces_server_url() {
        let mut config = AppConfig::default();
        config.apply_server_override(Some("  http://10.0.0.5:3000 ".to_string()));
        assert_eq!(config.server_url, "http://10.0.0.5:3000");

        config.apply_server_override(Some(String::new()));
        assert_eq!(config.server_url, "http://10.0.0.5:3000");
    }

    #[test]
    fn settings_and_level_follow_config() {
        let config = AppConfig {
            connect_timeout_secs: 3,
            request_timeout_secs: 7,
            log_level: "debug".to_string(),
            ..AppConfig::default()
        };
        let settings = config.client_settings();
        assert_eq!(settings.connect_timeout, Duration::from_secs(3));
        assert_eq!(settings.request_timeout, Duration::from_secs(7));
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);

        let bad = AppConfig {
            log_level: "chatty".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(bad.level_filter(), Err(ConfigError::LogLevel(_))));
    }
}
