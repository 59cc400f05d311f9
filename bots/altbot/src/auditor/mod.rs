// SPDX-License-Identifier: PMPL-1.0-or-later
//! Tag auditors deciding whether a document's image tags carry alt text.
//!
//! An auditor takes the full text of one document and returns a
//! [`Verdict`]. Auditing stops at the first violation: the verdict names
//! that violation only, later tags are never looked at.
//!
//! Two strategies share the [`Auditor`] contract:
//! - [`lexical::LexicalAuditor`]: literal substring search (default)
//! - [`structural::StructuralAuditor`]: HTML5 parse via `scraper`

pub mod lexical;
pub mod structural;

use serde::Serialize;

use crate::config::{AuditMode, ScanConfig};
use crate::error::Result;

/// Longest element excerpt carried in a violation
const ELEMENT_EXCERPT_CHARS: usize = 160;

/// Byte span of one tag inside a buffer, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagOccurrence {
    pub start: usize,
    pub end: usize,
}

/// Why a tag failed the audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// The tag has no accessibility attribute
    MissingAttribute,
    /// The tag is never closed with `>` before end of buffer
    MalformedTag,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::MissingAttribute => write!(f, "missing attribute"),
            ViolationKind::MalformedTag => write!(f, "malformed tag"),
        }
    }
}

/// The first tag that failed an audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Audited element name (e.g. "img")
    pub tag: String,
    /// Required attribute name (e.g. "alt")
    pub attribute: String,
    /// Location in the buffer, when known
    pub span: Option<TagOccurrence>,
    /// Line number (1-indexed), when known
    pub line: Option<usize>,
    /// Excerpt of the offending markup
    pub element: String,
}

impl Violation {
    /// One-line human description
    pub fn describe(&self) -> String {
        let location = match self.line {
            Some(line) => format!("line {}: ", line),
            None => String::new(),
        };
        match self.kind {
            ViolationKind::MissingAttribute => format!(
                "{}<{}> without {} attribute: {}",
                location, self.tag, self.attribute, self.element
            ),
            ViolationKind::MalformedTag => format!(
                "{}unterminated <{}> tag: {}",
                location, self.tag, self.element
            ),
        }
    }
}

/// Outcome of auditing one buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum Verdict {
    Compliant { tags_checked: usize },
    NonCompliant(Violation),
}

impl Verdict {
    pub fn is_compliant(&self) -> bool {
        matches!(self, Verdict::Compliant { .. })
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Verdict::Compliant { .. } => None,
            Verdict::NonCompliant(v) => Some(v),
        }
    }
}

/// Trait implemented by all auditors
pub trait Auditor: Send + Sync {
    /// Human-readable name of this auditor
    fn name(&self) -> &str;

    /// Audit one document; stops at the first violation
    fn audit(&self, content: &str) -> Verdict;
}

/// Build the auditor selected by the scan configuration
pub fn from_config(scan: &ScanConfig) -> Result<Box<dyn Auditor>> {
    match scan.mode {
        AuditMode::Lexical => Ok(Box::new(lexical::LexicalAuditor::new(
            &scan.tag,
            &scan.attribute,
        ))),
        AuditMode::Structural => Ok(Box::new(structural::StructuralAuditor::new(
            &scan.tag,
            &scan.attribute,
        )?)),
    }
}

/// 1-indexed line containing a byte offset
pub(crate) fn line_of(content: &str, offset: usize) -> usize {
    content[..offset.min(content.len())].matches('\n').count() + 1
}

/// Truncate markup for messages and logs
pub(crate) fn excerpt(markup: &str) -> String {
    let mut chars = markup.chars();
    let head: String = chars.by_ref().take(ELEMENT_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
