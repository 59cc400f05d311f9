// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation for scan outcomes.
//!
//! - Text: human-readable summary ending in the final assessment line
//! - JSON: the serialized [`ScanOutcome`]

use crate::scanner::ScanOutcome;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Generate a report from a scan outcome
pub fn generate_report(outcome: &ScanOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(outcome),
        OutputFormat::Json => generate_json_report(outcome),
    }
}

fn generate_text_report(outcome: &ScanOutcome) -> String {
    let mut output = String::new();

    output.push_str("=== Altbot Image Alt Text Report ===\n\n");
    output.push_str(&format!("Directory: {}\n", outcome.root.display()));
    output.push_str(&format!(
        "Files: {} found, {} audited, {} image tag(s) passed\n\n",
        outcome.files_found, outcome.files_audited, outcome.tags_checked
    ));

    if outcome.files_found == 0 {
        output.push_str("No files found to process.\n\n");
    }

    if let Some(ref fv) = outcome.violation {
        let v = &fv.violation;
        output.push_str(&format!("--- VIOLATION ({}) ---\n", v.kind));
        output.push_str(&format!("  Location: {}\n", fv.location_string()));
        output.push_str(&format!("  Element: {}\n", v.element));
        output.push_str(&format!(
            "  Fix: add {}=\"description\" for informative images or {}=\"\" for decorative ones\n",
            v.attribute, v.attribute
        ));
        output.push_str("  Scan stopped at the first violation.\n\n");
    }

    output.push_str(&outcome.assessment());
    output.push('\n');
    output
}

fn generate_json_report(outcome: &ScanOutcome) -> String {
    serde_json::to_string_pretty(outcome).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize scan outcome: {}\"}}", e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auditor::{TagOccurrence, Violation, ViolationKind};
    use crate::scanner::FileViolation;
    use std::path::PathBuf;

    fn outcome(violation: Option<FileViolation>) -> ScanOutcome {
        ScanOutcome {
            root: PathBuf::from("/work/source"),
            files_found: 2,
            files_audited: if violation.is_some() { 1 } else { 2 },
            tags_checked: 3,
            violation,
        }
    }

    fn sample_violation() -> FileViolation {
        FileViolation {
            file: PathBuf::from("/work/source/index.html"),
            violation: Violation {
                kind: ViolationKind::MissingAttribute,
                tag: "img".to_string(),
                attribute: "alt".to_string(),
                span: Some(TagOccurrence { start: 40, end: 57 }),
                line: Some(10),
                element: "<img src=\"a.png\">".to_string(),
            },
        }
    }

    #[test]
    fn test_text_report_compliant() {
        let report = generate_report(&outcome(None), OutputFormat::Text);
        assert!(report.contains("Files: 2 found, 2 audited"));
        assert!(report.ends_with("Final Code Assessment: Accessible code: True\n"));
    }

    #[test]
    fn test_text_report_violation() {
        let report = generate_report(&outcome(Some(sample_violation())), OutputFormat::Text);
        assert!(report.contains("VIOLATION (missing attribute)"));
        assert!(report.contains("/work/source/index.html:10"));
        assert!(report.contains("Accessible code: False"));
    }

    #[test]
    fn test_json_report() {
        let report = generate_report(&outcome(Some(sample_violation())), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert_eq!(parsed["files_found"], 2);
        assert_eq!(parsed["violation"]["violation"]["kind"], "missing-attribute");
        assert_eq!(parsed["violation"]["violation"]["span"]["start"], 40);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }
}
