// SPDX-License-Identifier: PMPL-1.0-or-later
//! Directory scanner for running the tag auditor across an artifact.
//!
//! Lists the directory, keeps regular files whose name matches the
//! configured glob, and audits them one at a time. The scan stops at the
//! first non-compliant file, so at most one violation is ever reported.

use globset::{Glob, GlobMatcher};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::auditor::{Auditor, Verdict, Violation};
use crate::config::ScanConfig;
use crate::error::{AltbotError, Result};

/// Violation together with the file it was found in
#[derive(Debug, Clone, Serialize)]
pub struct FileViolation {
    pub file: PathBuf,
    pub violation: Violation,
}

impl FileViolation {
    /// Get location string for display
    pub fn location_string(&self) -> String {
        match self.violation.line {
            Some(line) => format!("{}:{}", self.file.display(), line),
            None => self.file.display().to_string(),
        }
    }
}

/// Result of scanning one directory
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    /// Directory that was scanned
    pub root: PathBuf,
    /// Files matching the pattern
    pub files_found: usize,
    /// Files actually audited before the scan finished or stopped
    pub files_audited: usize,
    /// Image tags that passed, across audited files
    pub tags_checked: usize,
    /// First violation, if any
    pub violation: Option<FileViolation>,
}

impl ScanOutcome {
    pub fn is_compliant(&self) -> bool {
        self.violation.is_none()
    }

    /// The final assessment line reported to the pipeline
    pub fn assessment(&self) -> String {
        format!(
            "Final Code Assessment: Accessible code: {}",
            if self.is_compliant() { "True" } else { "False" }
        )
    }

    /// Assessment plus the offending location when there is one
    pub fn summary(&self) -> String {
        match &self.violation {
            None => self.assessment(),
            Some(fv) => format!(
                "{} ({}: {})",
                self.assessment(),
                fv.file.display(),
                fv.violation.describe()
            ),
        }
    }
}

/// Files under `dir` whose name matches the scan pattern.
///
/// Order is whatever the directory listing yields unless `scan.sorted`
/// is set.
pub fn find_files(dir: &Path, scan: &ScanConfig) -> Result<Vec<PathBuf>> {
    let matcher: GlobMatcher = Glob::new(&scan.pattern)?.compile_matcher();

    let mut walker = WalkDir::new(dir).min_depth(1).follow_links(false);
    if !scan.recursive {
        walker = walker.max_depth(1);
    }
    if scan.sorted {
        walker = walker.sort_by_file_name();
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            AltbotError::FileUnreadable {
                path,
                source: e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop")
                }),
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Scan a directory, auditing each matching file until one fails
pub fn scan_directory(dir: &Path, scan: &ScanConfig, auditor: &dyn Auditor) -> Result<ScanOutcome> {
    info!("Reading directory: {}", dir.display());

    let files = find_files(dir, scan)?;
    let mut outcome = ScanOutcome {
        root: dir.to_path_buf(),
        files_found: files.len(),
        files_audited: 0,
        tags_checked: 0,
        violation: None,
    };

    if files.is_empty() {
        info!("No files matching {} found to process", scan.pattern);
    }

    for path in files {
        info!("Opening file: {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|source| AltbotError::FileUnreadable {
            path: path.clone(),
            source,
        })?;

        let verdict = auditor.audit(&content);
        outcome.files_audited += 1;
        info!(
            "Buffer Assessment: Accessible code: {}",
            if verdict.is_compliant() { "True" } else { "False" }
        );

        match verdict {
            Verdict::Compliant { tags_checked } => {
                outcome.tags_checked += tags_checked;
            }
            Verdict::NonCompliant(violation) => {
                outcome.violation = Some(FileViolation { file: path, violation });
                break;
            }
        }
    }

    info!(
        "Audited {} of {} file(s): {}",
        outcome.files_audited,
        outcome.files_found,
        outcome.assessment()
    );

    Ok(outcome)
}

/// Scan a single file
pub fn scan_file(path: &Path, auditor: &dyn Auditor) -> Result<Verdict> {
    let content = std::fs::read_to_string(path).map_err(|source| AltbotError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(auditor.audit(&content))
}
