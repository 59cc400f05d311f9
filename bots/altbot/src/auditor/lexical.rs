// SPDX-License-Identifier: PMPL-1.0-or-later
//! Lexical tag auditor
//!
//! Finds `<img` by literal substring, takes the next `>` as the end of the
//! tag, and requires the literal ` alt=` between the two. This is not an
//! HTML parse: matching is case-sensitive, the attribute needs a leading
//! space, and the attribute value is never inspected. A `<img` with no
//! closing `>` before end of buffer is reported as malformed.

use tracing::debug;

use crate::auditor::{excerpt, line_of, Auditor, TagOccurrence, Verdict, Violation, ViolationKind};

/// Substring-based auditor
#[derive(Debug, Clone)]
pub struct LexicalAuditor {
    tag: String,
    attribute: String,
    /// `<` + tag
    open: String,
    /// ` ` + attribute + `=`
    needle: String,
}

impl LexicalAuditor {
    pub fn new(tag: &str, attribute: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
            open: format!("<{}", tag),
            needle: format!(" {}=", attribute),
        }
    }

    fn violation(&self, content: &str, kind: ViolationKind, span: TagOccurrence) -> Violation {
        Violation {
            kind,
            tag: self.tag.clone(),
            attribute: self.attribute.clone(),
            span: Some(span),
            line: Some(line_of(content, span.start)),
            element: excerpt(&content[span.start..span.end]),
        }
    }
}

impl Default for LexicalAuditor {
    fn default() -> Self {
        Self::new("img", "alt")
    }
}

impl Auditor for LexicalAuditor {
    fn name(&self) -> &str {
        "Lexical Tag Auditor"
    }

    fn audit(&self, content: &str) -> Verdict {
        let mut cursor = 0;
        let mut tags_checked = 0;

        while let Some(found) = content[cursor..].find(&self.open) {
            let start = cursor + found;

            let Some(close) = content[start..].find('>') else {
                let span = TagOccurrence { start, end: content.len() };
                debug!("Evaluation: unterminated tag at offset {}", start);
                return Verdict::NonCompliant(self.violation(content, ViolationKind::MalformedTag, span));
            };
            let end = start + close;

            debug!("Evaluating: {}", excerpt(&content[start..=end]));

            if !content[start..end].contains(&self.needle) {
                debug!("Evaluation: cannot find an {} string", self.attribute);
                let span = TagOccurrence { start, end: end + 1 };
                return Verdict::NonCompliant(self.violation(
                    content,
                    ViolationKind::MissingAttribute,
                    span,
                ));
            }

            debug!("Evaluation: found an {} string", self.attribute);
            tags_checked += 1;
            cursor = end;
        }

        Verdict::Compliant { tags_checked }
    }
}
