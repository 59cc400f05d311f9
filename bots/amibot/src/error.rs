// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for amibot

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, AmiError>;

#[derive(Error, Debug)]
pub enum AmiError {
    #[error("Missing resource property: {0}")]
    MissingProperty(&'static str),

    #[error("Image {image_id} entered state {state}")]
    ImageFailed { image_id: String, state: String },

    #[error("Image {image_id} not available after {attempts} checks")]
    WaitTimeout { image_id: String, attempts: u32 },

    #[error("EC2 error: {0}")]
    Ec2(String),

    #[error("Response error: {0}")]
    Response(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for AmiError {
    fn from(err: config::ConfigError) -> Self {
        AmiError::Config(err.to_string())
    }
}

impl<E: std::error::Error + 'static> From<rusoto_core::RusotoError<E>> for AmiError {
    fn from(err: rusoto_core::RusotoError<E>) -> Self {
        AmiError::Ec2(err.to_string())
    }
}
