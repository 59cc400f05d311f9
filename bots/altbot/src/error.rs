// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for altbot

use std::path::PathBuf;
use thiserror::Error;

use crate::notifier::FailureType;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, AltbotError>;

/// Main error type for altbot
///
/// Compliance failures are not errors; they travel as a
/// [`Verdict`](crate::auditor::Verdict). These variants mean the check
/// itself could not run.
#[derive(Error, Debug)]
pub enum AltbotError {
    #[error("Artifact {location} is unavailable: {reason}")]
    ArtifactUnavailable { location: String, reason: String },

    #[error("Artifact {location} is not a valid zip archive: {reason}")]
    InvalidArchive { location: String, reason: String },

    #[error("Cannot read {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pipeline event: {0}")]
    Event(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] globset::Error),

    #[error("Notifier error: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AltbotError {
    /// CodePipeline failure type reported for this error
    pub fn failure_type(&self) -> FailureType {
        match self {
            AltbotError::ArtifactUnavailable { .. } => FailureType::RevisionUnavailable,
            AltbotError::Config(_) | AltbotError::GlobPattern(_) | AltbotError::Event(_) => {
                FailureType::ConfigurationError
            }
            _ => FailureType::JobFailed,
        }
    }
}

impl From<config::ConfigError> for AltbotError {
    fn from(err: config::ConfigError) -> Self {
        AltbotError::Config(err.to_string())
    }
}
