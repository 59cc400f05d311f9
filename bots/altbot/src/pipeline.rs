// SPDX-License-Identifier: PMPL-1.0-or-later
//! CodePipeline job handling: event parsing and the fetch → scan → notify flow.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::artifact::{ArtifactFetcher, ArtifactLocation, ObjectStore, WorkDir};
use crate::auditor::{self, Auditor};
use crate::config::Config;
use crate::error::{AltbotError, Result};
use crate::notifier::{FailureType, JobFailure, JobNotifier};
use crate::scanner::{self, ScanOutcome};

/// Invocation payload sent by CodePipeline to a Lambda action
#[derive(Debug, Clone, Deserialize)]
pub struct CodePipelineEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: Job,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
    pub data: JobData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobData {
    #[serde(rename = "inputArtifacts", default)]
    pub input_artifacts: Vec<InputArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputArtifact {
    #[serde(default)]
    pub name: Option<String>,
    pub location: WireLocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLocation {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "s3Location")]
    pub s3_location: S3Location,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Location {
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
    #[serde(rename = "objectKey")]
    pub object_key: String,
}

impl CodePipelineEvent {
    /// Location of the first input artifact
    pub fn artifact_location(&self) -> Result<ArtifactLocation> {
        let artifact = self
            .job
            .data
            .input_artifacts
            .first()
            .ok_or_else(|| AltbotError::Event(format!("job {} has no input artifacts", self.job.id)))?;
        let s3 = &artifact.location.s3_location;
        Ok(ArtifactLocation::new(&s3.bucket_name, &s3.object_key))
    }
}

/// What a job run ended with
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: String,
    pub compliant: bool,
    /// The check itself could not run; `compliant` is false but says
    /// nothing about the artifact
    pub check_failed: bool,
    /// Message returned to the caller and, on failure, sent to the pipeline
    pub message: String,
}

/// The accessibility gate: fetch the artifact, scan it, report the verdict
pub struct AccessibilityCheck<S> {
    fetcher: ArtifactFetcher<S>,
    auditor: Box<dyn Auditor>,
    config: Config,
}

impl<S: ObjectStore> AccessibilityCheck<S> {
    pub fn new(store: S, config: Config) -> Result<Self> {
        let auditor = auditor::from_config(&config.scan)?;
        info!("Using {} ({})", auditor.name(), config.scan.mode);
        Ok(Self {
            fetcher: ArtifactFetcher::new(store, config.artifact.clone()),
            auditor,
            config,
        })
    }

    /// Download, expand and scan one artifact in a scoped working directory
    pub async fn assess(&self, location: &ArtifactLocation) -> Result<ScanOutcome> {
        let workdir = WorkDir::create(&self.config.artifact)?;
        let source = self.fetcher.fetch(location, &workdir).await?;
        scanner::scan_directory(&source, &self.config.scan, self.auditor.as_ref())
    }

    /// Run the job and report its outcome through `notifier`.
    ///
    /// Only notifier failures are returned as errors; everything else is
    /// reported to the pipeline and described in the [`JobReport`].
    pub async fn run_job<N: JobNotifier + ?Sized>(
        &self,
        notifier: &N,
        job_id: &str,
        location: &ArtifactLocation,
    ) -> Result<JobReport> {
        info!("S3 Bucket: {}, Object: {}", location.bucket, location.key);

        let report = match self.assess(location).await {
            Ok(outcome) if outcome.is_compliant() => {
                let message = outcome.assessment();
                info!("{}", message);
                notifier.report_success(job_id).await?;
                JobReport {
                    job_id: job_id.to_string(),
                    compliant: true,
                    check_failed: false,
                    message,
                }
            }
            Ok(outcome) => {
                let failure = JobFailure::new(FailureType::JobFailed, outcome.summary());
                self.report_failure(notifier, job_id, failure, false).await?
            }
            Err(e) => self.report_error(notifier, job_id, &e).await?,
        };

        info!("End of handler");
        Ok(report)
    }

    /// Handle a CodePipeline invocation
    pub async fn handle_event<N: JobNotifier + ?Sized>(
        &self,
        notifier: &N,
        event: &CodePipelineEvent,
    ) -> Result<JobReport> {
        let job_id = &event.job.id;
        match event.artifact_location() {
            Ok(location) => self.run_job(notifier, job_id, &location).await,
            Err(e) => self.report_error(notifier, job_id, &e).await,
        }
    }

    async fn report_error<N: JobNotifier + ?Sized>(
        &self,
        notifier: &N,
        job_id: &str,
        err: &AltbotError,
    ) -> Result<JobReport> {
        error!("Accessibility check could not run: {}", err);
        let message = format!("Accessibility check could not run: {}", err);
        let failure = JobFailure::new(err.failure_type(), message);
        self.report_failure(notifier, job_id, failure, true).await
    }

    async fn report_failure<N: JobNotifier + ?Sized>(
        &self,
        notifier: &N,
        job_id: &str,
        failure: JobFailure,
        check_failed: bool,
    ) -> Result<JobReport> {
        let failure = failure.truncated(self.config.notifier.max_message_len);
        info!("{}", failure.message);
        notifier.report_failure(job_id, &failure).await?;
        Ok(JobReport {
            job_id: job_id.to_string(),
            compliant: false,
            check_failed,
            message: failure.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"{
        "CodePipeline.job": {
            "id": "11111111-abcd-1111-abcd-111111abcdef",
            "accountId": "111111111111",
            "data": {
                "actionConfiguration": {
                    "configuration": { "FunctionName": "altbot" }
                },
                "inputArtifacts": [
                    {
                        "name": "SourceOutput",
                        "revision": null,
                        "location": {
                            "type": "S3",
                            "s3Location": {
                                "bucketName": "codepipeline-us-east-1-artifacts",
                                "objectKey": "Demo/SourceOutp/abc123.zip"
                            }
                        }
                    }
                ],
                "outputArtifacts": [],
                "artifactCredentials": {
                    "accessKeyId": "AKIA",
                    "secretAccessKey": "secret",
                    "sessionToken": "token"
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_event() {
        let event: CodePipelineEvent = serde_json::from_str(EVENT).unwrap();
        assert_eq!(event.job.id, "11111111-abcd-1111-abcd-111111abcdef");
        assert_eq!(event.job.account_id.as_deref(), Some("111111111111"));

        let location = event.artifact_location().unwrap();
        assert_eq!(location.bucket, "codepipeline-us-east-1-artifacts");
        assert_eq!(location.key, "Demo/SourceOutp/abc123.zip");
    }

    #[test]
    fn test_event_without_artifacts() {
        let event: CodePipelineEvent = serde_json::from_str(
            r#"{"CodePipeline.job": {"id": "job-1", "data": {"inputArtifacts": []}}}"#,
        )
        .unwrap();
        let err = event.artifact_location().unwrap_err();
        assert!(matches!(err, AltbotError::Event(_)));
    }
}
