// SPDX-License-Identifier: PMPL-1.0-or-later
//! Reporting the job outcome back to the pipeline.

use async_trait::async_trait;
use rusoto_codepipeline::{
    CodePipeline, CodePipelineClient, FailureDetails, PutJobFailureResultInput,
    PutJobSuccessResultInput,
};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::info;

use crate::error::{AltbotError, Result};

/// CodePipeline failure type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureType {
    JobFailed,
    ConfigurationError,
    RevisionUnavailable,
}

impl FailureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureType::JobFailed => "JobFailed",
            FailureType::ConfigurationError => "ConfigurationError",
            FailureType::RevisionUnavailable => "RevisionUnavailable",
        }
    }
}

impl std::fmt::Display for FailureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure detail sent with a failed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub kind: FailureType,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Cut the message to at most `max_len` bytes on a char boundary
    pub fn truncated(mut self, max_len: usize) -> Self {
        if self.message.len() > max_len {
            let mut cut = max_len;
            while !self.message.is_char_boundary(cut) {
                cut -= 1;
            }
            self.message.truncate(cut);
        }
        self
    }
}

/// Orchestration notifier abstraction
#[async_trait]
pub trait JobNotifier: Send + Sync {
    /// Report that the job passed
    async fn report_success(&self, job_id: &str) -> Result<()>;

    /// Report that the job failed
    async fn report_failure(&self, job_id: &str, failure: &JobFailure) -> Result<()>;
}

/// CodePipeline job result reporter
pub struct CodePipelineNotifier {
    client: CodePipelineClient,
}

impl CodePipelineNotifier {
    pub fn new(client: CodePipelineClient) -> Self {
        Self { client }
    }

    /// Client for the region taken from the environment
    pub fn from_env() -> Self {
        Self::new(CodePipelineClient::new(rusoto_core::Region::default()))
    }
}

#[async_trait]
impl JobNotifier for CodePipelineNotifier {
    async fn report_success(&self, job_id: &str) -> Result<()> {
        info!("Putting job success for {}", job_id);
        let input = PutJobSuccessResultInput {
            job_id: job_id.to_string(),
            ..Default::default()
        };
        self.client
            .put_job_success_result(input)
            .await
            .map_err(|e| AltbotError::Notify(e.to_string()))
    }

    async fn report_failure(&self, job_id: &str, failure: &JobFailure) -> Result<()> {
        info!("Putting job failure for {} ({})", job_id, failure.kind);
        let input = PutJobFailureResultInput {
            job_id: job_id.to_string(),
            failure_details: FailureDetails {
                message: failure.message.clone(),
                type_: failure.kind.as_str().to_string(),
                external_execution_id: None,
            },
        };
        self.client
            .put_job_failure_result(input)
            .await
            .map_err(|e| AltbotError::Notify(e.to_string()))
    }
}

/// Prints job outcomes instead of reporting them, for local runs
pub struct ConsoleNotifier<W = std::io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleNotifier {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn print(&self, line: String) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| AltbotError::Internal("console writer poisoned".to_string()))?;
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> JobNotifier for ConsoleNotifier<W> {
    async fn report_success(&self, job_id: &str) -> Result<()> {
        self.print(format!("Job {} succeeded", job_id))
    }

    async fn report_failure(&self, job_id: &str, failure: &JobFailure) -> Result<()> {
        self.print(format!("Job {} failed [{}]: {}", job_id, failure.kind, failure.message))
    }
}
