//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `show.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: Where the http api listens.
//!     - AuthConfig: Admin console password.
//!     - StorageConfig: Directory holding the stats/scores json files.
//!     - ShowConfig: Shape of the show state (camera count, vital count).
//!     - ErrorsConfig: Client error log capacity.
//!     - BatteryConfig: Server-side battery simulation toggle and timings.
//!     - MediaMount: Optional static directories (videos, audio, images).
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub show: ShowConfig,
    pub errors: ErrorsConfig,
    pub battery: BatteryConfig,
    pub logging: LoggingConfig,
    pub media: Vec<MediaMount>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub password: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ShowConfig {
    /// highest selectable camera (cameras are numbered from 1)
    pub camera_count: u8,
    pub vital_count: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ErrorsConfig {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BatteryConfig {
    /// run the simulation on the server and feed `batteryLevel` from it
    pub simulate: bool,
    pub tick_ms: u64,
    pub clusters: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MediaMount {
    /// url prefix, e.g. "/videos"
    pub route: String,
    pub dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0".to_string(), port: 3001 }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { password: "1234".to_string() }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("data") }
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self { camera_count: 4, vital_count: 3 }
    }
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self { simulate: false, tick_ms: 50, clusters: 1 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Where the running configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// no usable file; `failures` lists files that existed but did not load
    Defaults { failures: Vec<(PathBuf, String)> },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::info!(path = %path.display(), "loaded config"),
            Self::Defaults { failures } => {
                for (path, error) in failures {
                    tracing::warn!(path = %path.display(), %error, "failed to load config");
                }
                tracing::warn!("no config file found, using defaults");
            }
        }
    }
}

impl StorageConfig {
    pub fn stats_file(&self) -> PathBuf {
        self.data_dir.join("questionnaire-stats.json")
    }

    pub fn scores_file(&self) -> PathBuf {
        self.data_dir.join("scores.json")
    }
}

impl HostConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a toml document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: HostConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load with default fallback.
    ///
    /// Runs before logging is up, so the outcome is returned rather than
    /// logged; call [`ConfigOrigin::log`] once the subscriber exists.
    pub fn load_or_default() -> (Self, ConfigOrigin) {
        let paths = [
            PathBuf::from("config").join("show.toml"),
            PathBuf::from("..").join("config").join("show.toml"),
        ];

        let mut failures = Vec::new();
        for path in paths {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return (config, ConfigOrigin::File(path)),
                    Err(e) => failures.push((path, e.to_string())),
                }
            }
        }

        (Self::default(), ConfigOrigin::Defaults { failures })
    }

    pub fn validate(&self) -> Result<()> {
        if self.show.camera_count == 0 {
            return Err(Error::config_validation("show.camera_count must be at least 1"));
        }
        if self.show.vital_count == 0 {
            return Err(Error::config_validation("show.vital_count must be at least 1"));
        }
        if self.errors.capacity == 0 {
            return Err(Error::config_validation("errors.capacity must be at least 1"));
        }
        if self.battery.clusters == 0 {
            return Err(Error::config_validation("battery.clusters must be at least 1"));
        }
        if self.battery.tick_ms == 0 {
            return Err(Error::config_validation("battery.tick_ms must be positive"));
        }
        for mount in &self.media {
            if !mount.route.starts_with('/') || mount.route.starts_with("/api") {
                return Err(Error::config_validation(format!(
                    "media route {:?} must start with '/' and not shadow /api",
                    mount.route
                )));
            }
        }
        Ok(())
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        tracing::info!(
            bind = %self.server.bind,
            port = self.server.port,
            data_dir = %self.storage.data_dir.display(),
            cameras = self.show.camera_count,
            vitals = self.show.vital_count,
            error_capacity = self.errors.capacity,
            battery_simulation = self.battery.simulate,
            media_mounts = self.media.len(),
            "host configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.auth.password, "1234");
        assert_eq!(config.show.camera_count, 4);
        assert_eq!(config.show.vital_count, 3);
        assert_eq!(config.errors.capacity, 100);
        assert!(!config.battery.simulate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HostConfig::from_toml(
            r#"
            [server]
            port = 8080

            [battery]
            simulate = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert!(config.battery.simulate);
        assert_eq!(config.battery.tick_ms, 50);
    }

    #[test]
    fn test_media_mounts() {
        let config = HostConfig::from_toml(
            r#"
            [[media]]
            route = "/videos"
            dir = "public/videos"
            "#,
        )
        .unwrap();
        assert_eq!(config.media.len(), 1);
        assert_eq!(config.media[0].dir, PathBuf::from("public/videos"));
    }

    #[test]
    fn test_media_route_cannot_shadow_api() {
        let err = HostConfig::from_toml(
            r#"
            [[media]]
            route = "/api/videos"
            dir = "x"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_zero_cameras_rejected() {
        let err = HostConfig::from_toml("[show]\ncamera_count = 0\n").unwrap_err();
        assert!(err.to_string().contains("camera_count"));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = HostConfig::from_toml("[server\nport = 1").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = HostConfig::load("/nonexistent/show.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_storage_paths() {
        let storage = StorageConfig { data_dir: PathBuf::from("/srv/show") };
        assert_eq!(storage.stats_file(), PathBuf::from("/srv/show/questionnaire-stats.json"));
        assert_eq!(storage.scores_file(), PathBuf::from("/srv/show/scores.json"));
    }
}
