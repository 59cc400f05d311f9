// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structural tag auditor
//!
//! Parses the document as HTML5 and checks every matching element for the
//! attribute. Presence is enough: `alt=""` marks a decorative image and
//! passes, as it does for the lexical auditor. Tag matching follows the
//! parser, so `<IMG>` is audited here.

use scraper::{Html, Selector};
use tracing::debug;

use crate::auditor::{excerpt, line_of, Auditor, TagOccurrence, Verdict, Violation, ViolationKind};
use crate::error::{AltbotError, Result};

/// HTML5-parse auditor
#[derive(Debug, Clone)]
pub struct StructuralAuditor {
    tag: String,
    attribute: String,
    selector: Selector,
}

impl StructuralAuditor {
    pub fn new(tag: &str, attribute: &str) -> Result<Self> {
        let selector = Selector::parse(tag)
            .map_err(|e| AltbotError::Config(format!("invalid tag selector {:?}: {}", tag, e)))?;
        Ok(Self {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
            selector,
        })
    }
}

impl Auditor for StructuralAuditor {
    fn name(&self) -> &str {
        "Structural Tag Auditor"
    }

    fn audit(&self, content: &str) -> Verdict {
        let document = Html::parse_document(content);
        let mut tags_checked = 0;

        for (idx, element) in document.select(&self.selector).enumerate() {
            if element.value().attr(&self.attribute).is_some() {
                tags_checked += 1;
                continue;
            }

            let markup = format!(
                "<{}{}>",
                self.tag,
                element
                    .value()
                    .attrs()
                    .map(|(k, v)| format!(" {}=\"{}\"", k, v))
                    .collect::<String>()
            );
            debug!("Evaluation: {} has no {} attribute", markup, self.attribute);

            let span = nth_open_tag(content, &self.tag, idx);
            return Verdict::NonCompliant(Violation {
                kind: ViolationKind::MissingAttribute,
                tag: self.tag.clone(),
                attribute: self.attribute.clone(),
                span,
                line: span.map(|s| line_of(content, s.start)),
                element: excerpt(&markup),
            });
        }

        Verdict::Compliant { tags_checked }
    }
}

/// Estimate where the n-th element sits by counting `<tag` case-insensitively.
///
/// Occurrences inside `<!-- ... -->` are skipped, as the parser skips them.
fn nth_open_tag(content: &str, tag: &str, n: usize) -> Option<TagOccurrence> {
    let lower = content.to_ascii_lowercase();
    let open = format!("<{}", tag.to_ascii_lowercase());

    let mut cursor = 0;
    let mut seen = 0;
    loop {
        let rest = &lower[cursor..];
        let found = rest.find(&open)?;

        if let Some(comment) = rest.find("<!--").filter(|&c| c < found) {
            let body = cursor + comment + 4;
            cursor = body + lower[body..].find("-->")? + 3;
            continue;
        }

        let start = cursor + found;
        if seen == n {
            let end = lower[start..]
                .find('>')
                .map(|close| start + close + 1)
                .unwrap_or(content.len());
            return Some(TagOccurrence { start, end });
        }
        seen += 1;
        cursor = start + open.len();
    }
}
