// SPDX-License-Identifier: PMPL-1.0-or-later
//! Custom resource responses, delivered to the pre-signed S3 URL in the request.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{AmiError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Body CloudFormation expects at the response URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: BTreeMap<String, String>,
}

#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(&self, url: &str, response: &CustomResourceResponse) -> Result<()>;
}

/// Sends responses with a plain HTTP PUT
pub struct HttpResponseSender {
    client: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpResponseSender {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(&self, url: &str, response: &CustomResourceResponse) -> Result<()> {
        let body = serde_json::to_vec(response)?;
        info!("Sending {:?} response for {}", response.status, response.logical_resource_id);

        // The URL is signed for an empty content type
        let reply = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "")
            .body(body)
            .send()
            .await?;

        let status = reply.status();
        if !status.is_success() {
            let text = reply.text().await.unwrap_or_default();
            return Err(AmiError::Response(format!("{}: {}", status, text)));
        }

        info!("Response accepted ({})", status);
        Ok(())
    }
}
