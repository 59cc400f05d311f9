// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration management for amibot
//!
//! Same layering as altbot: an optional file under `AMIBOT__SECTION__KEY`
//! environment variables, every field defaulted.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// The image being managed
    #[serde(default)]
    pub image: ImageConfig,

    /// Polling while a new image becomes available
    #[serde(default)]
    pub wait: WaitConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Image name, also used to find the image again on delete
    #[serde(default = "default_image_name")]
    pub name: String,

    #[serde(default = "default_image_description")]
    pub description: String,

    /// `Name` tag put on the image's snapshot
    #[serde(default = "default_snapshot_tag")]
    pub snapshot_tag: String,

    /// Image the instance without stopping it
    #[serde(default = "default_true")]
    pub no_reboot: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: default_image_name(),
            description: default_image_description(),
            snapshot_tag: default_snapshot_tag(),
            no_reboot: true,
        }
    }
}

fn default_image_name() -> String {
    "DemoWebServerAMI".to_string()
}

fn default_image_description() -> String {
    "Demo AMI created for autoscaling group".to_string()
}

fn default_snapshot_tag() -> String {
    "DemoWebServerSnapshot".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    40
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from an optional file plus `AMIBOT__*` environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            } else {
                tracing::warn!("Config file {} not found, using defaults", path.display());
            }
        }

        let config = builder
            .add_source(config::Environment::with_prefix("AMIBOT").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.image.name, "DemoWebServerAMI");
        assert_eq!(config.image.snapshot_tag, "DemoWebServerSnapshot");
        assert!(config.image.no_reboot);
        assert_eq!(config.wait.poll_interval(), Duration::from_secs(15));
        assert_eq!(config.wait.max_attempts, 40);
    }

    #[test]
    fn test_load_yaml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("amibot.yaml");
        std::fs::write(&path, "image:\n  name: StagingAMI\nwait:\n  max_attempts: 5\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.image.name, "StagingAMI");
        assert_eq!(config.wait.max_attempts, 5);
        assert_eq!(config.wait.poll_interval_secs, 15);
        assert_eq!(config.image.snapshot_tag, "DemoWebServerSnapshot");
    }
}
