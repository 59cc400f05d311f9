// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration management for altbot
//!
//! Values come from an optional TOML/YAML file layered under environment
//! variables of the form `ALTBOT__SECTION__KEY` (for example
//! `ALTBOT__SCAN__PATTERN=*.htm`). Every field has a default, so an empty
//! environment yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where artifacts are downloaded and expanded
    #[serde(default)]
    pub artifact: ArtifactConfig,

    /// Which files are audited and how
    #[serde(default)]
    pub scan: ScanConfig,

    /// Pipeline reporting settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Root under which each invocation gets its own working directory.
    /// Defaults to the system temp directory.
    #[serde(default)]
    pub work_root: Option<PathBuf>,

    /// File name the downloaded archive is written to
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            work_root: None,
            archive_name: default_archive_name(),
        }
    }
}

impl ArtifactConfig {
    /// Resolved working-directory root
    pub fn work_root(&self) -> PathBuf {
        self.work_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn default_archive_name() -> String {
    "sourcecode.zip".to_string()
}

/// Auditing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditMode {
    /// Literal substring search for `<tag` ... ` attr=` ... `>`
    #[default]
    Lexical,
    /// HTML5 parse, attribute presence per element
    Structural,
}

impl std::fmt::Display for AuditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditMode::Lexical => write!(f, "lexical"),
            AuditMode::Structural => write!(f, "structural"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Glob matched against file names (case-sensitive)
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,

    /// Audit files in name order instead of directory-listing order
    #[serde(default)]
    pub sorted: bool,

    /// Element name to audit
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Attribute every audited element must carry
    #[serde(default = "default_attribute")]
    pub attribute: String,

    #[serde(default)]
    pub mode: AuditMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            recursive: false,
            sorted: false,
            tag: default_tag(),
            attribute: default_attribute(),
            mode: AuditMode::default(),
        }
    }
}

fn default_pattern() -> String {
    "*.html".to_string()
}

fn default_tag() -> String {
    "img".to_string()
}

fn default_attribute() -> String {
    "alt".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Failure messages longer than this are truncated before reporting
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            max_message_len: default_max_message_len(),
        }
    }
}

fn default_max_message_len() -> usize {
    5000 // CodePipeline FailureDetails.message limit
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
    /// Default level for the altbot target when `RUST_LOG` is unset
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
    /// Load configuration from an optional file plus `ALTBOT__*` environment
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
            .add_source(config::Environment::with_prefix("ALTBOT").separator("__"))
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
        assert_eq!(config.scan.pattern, "*.html");
        assert_eq!(config.scan.tag, "img");
        assert_eq!(config.scan.attribute, "alt");
        assert_eq!(config.scan.mode, AuditMode::Lexical);
        assert!(!config.scan.recursive);
        assert_eq!(config.artifact.archive_name, "sourcecode.zip");
        assert_eq!(config.notifier.max_message_len, 5000);
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_load_from_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("altbot.toml");
        std::fs::write(
            &path,
            r#"
[scan]
pattern = "*.htm"
mode = "structural"
sorted = true

[artifact]
work_root = "/var/tmp/altbot"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.scan.pattern, "*.htm");
        assert_eq!(config.scan.mode, AuditMode::Structural);
        assert!(config.scan.sorted);
        // Unset fields keep their defaults
        assert_eq!(config.scan.attribute, "alt");
        assert_eq!(config.artifact.work_root(), PathBuf::from("/var/tmp/altbot"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("altbot.toml");
        std::fs::write(&path, "[scan]\nsorted = false\n\n[notifier]\nmax_message_len = 100\n").unwrap();

        std::env::set_var("ALTBOT__SCAN__SORTED", "true");
        std::env::set_var("ALTBOT__SCAN__MODE", "structural");
        std::env::set_var("ALTBOT__NOTIFIER__MAX_MESSAGE_LEN", "42");
        let loaded = Config::load(Some(&path));
        std::env::remove_var("ALTBOT__SCAN__SORTED");
        std::env::remove_var("ALTBOT__SCAN__MODE");
        std::env::remove_var("ALTBOT__NOTIFIER__MAX_MESSAGE_LEN");

        let config = loaded.unwrap();
        assert!(config.scan.sorted);
        assert_eq!(config.scan.mode, AuditMode::Structural);
        assert_eq!(config.notifier.max_message_len, 42);
        assert_eq!(config.scan.pattern, "*.html");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/altbot.toml"))).unwrap();
        assert_eq!(config.scan.pattern, "*.html");
    }
}
