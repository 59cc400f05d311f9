// SPDX-License-Identifier: PMPL-1.0-or-later
//! Artifact retrieval: download a zip from object storage and expand it.
//!
//! Every invocation works in its own [`WorkDir`], created under the
//! configured root and removed when dropped. Retrieval and archive errors
//! are returned to the caller; nothing is swallowed.

use async_trait::async_trait;
use rusoto_s3::{GetObjectRequest, S3Client, S3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::ArtifactConfig;
use crate::error::{AltbotError, Result};

/// Bucket and key of an input artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
}

impl ArtifactLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Object storage abstraction
///
/// The fetcher only ever needs to copy one object to a local file.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write the object's bytes to `dest`, returning the byte count
    async fn download(&self, location: &ArtifactLocation, dest: &Path) -> Result<u64>;
}

/// S3-backed object store
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Client for the region taken from the environment
    pub fn from_env() -> Self {
        Self::new(S3Client::new(rusoto_core::Region::default()))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn download(&self, location: &ArtifactLocation, dest: &Path) -> Result<u64> {
        let unavailable = |reason: String| AltbotError::ArtifactUnavailable {
            location: location.to_string(),
            reason,
        };

        let request = GetObjectRequest {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
            ..Default::default()
        };
        let output = self
            .client
            .get_object(request)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let body = output
            .body
            .ok_or_else(|| unavailable("response has no body".to_string()))?;

        let mut reader = Box::pin(body.into_async_read());
        let mut file = tokio::fs::File::create(dest).await?;
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        file.flush().await?;

        Ok(written)
    }
}

/// Object store backed by a local directory laid out as `<root>/<bucket>/<key>`
///
/// Used for offline runs of the CLI.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn download(&self, location: &ArtifactLocation, dest: &Path) -> Result<u64> {
        let source = self.root.join(&location.bucket).join(&location.key);
        tokio::fs::copy(&source, dest)
            .await
            .map_err(|e| AltbotError::ArtifactUnavailable {
                location: location.to_string(),
                reason: format!("{}: {}", source.display(), e),
            })
    }
}

/// Per-invocation working directory, removed on drop
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Create a fresh directory under the configured root
    pub fn create(config: &ArtifactConfig) -> Result<Self> {
        let root = config.work_root();
        std::fs::create_dir_all(&root)?;
        let dir = tempfile::Builder::new().prefix("altbot-").tempdir_in(&root)?;
        debug!("Created working directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the archive contents are expanded
    pub fn source_dir(&self) -> PathBuf {
        self.dir.path().join("source")
    }
}

/// Downloads artifacts and expands them into a working directory
pub struct ArtifactFetcher<S> {
    store: S,
    config: ArtifactConfig,
}

impl<S: ObjectStore> ArtifactFetcher<S> {
    pub fn new(store: S, config: ArtifactConfig) -> Self {
        Self { store, config }
    }

    /// Download the archive into `workdir` and expand it.
    ///
    /// Returns the directory holding the expanded files.
    pub async fn fetch(&self, location: &ArtifactLocation, workdir: &WorkDir) -> Result<PathBuf> {
        let archive = workdir.path().join(&self.config.archive_name);
        info!("Copying {} to {}", location, archive.display());

        let bytes = self.store.download(location, &archive).await?;
        debug!("Downloaded {} bytes", bytes);

        let target = workdir.source_dir();
        let label = location.to_string();
        let extract_to = target.clone();
        tokio::task::spawn_blocking(move || extract_archive(&archive, &extract_to, &label))
            .await
            .map_err(|e| AltbotError::Internal(format!("extraction task failed: {}", e)))??;

        info!("Extracted {} to {}", location, target.display());
        Ok(target)
    }
}

/// Expand every entry of a zip archive into `target`
pub fn extract_archive(archive: &Path, target: &Path, label: &str) -> Result<()> {
    let invalid = |reason: String| AltbotError::InvalidArchive {
        location: label.to_string(),
        reason,
    };

    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;
    std::fs::create_dir_all(target)?;
    zip.extract(target).map_err(|e| invalid(e.to_string()))?;

    debug!("Expanded {} entries from {}", zip.len(), archive.display());
    Ok(())
}
