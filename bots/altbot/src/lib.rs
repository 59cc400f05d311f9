// SPDX-License-Identifier: PMPL-1.0-or-later
//! Altbot - image alt text gate for CodePipeline
//!
//! Altbot runs as a Lambda action inside a CodePipeline. It downloads the
//! input artifact (a zip) from S3, expands it into a per-invocation working
//! directory, audits every `*.html` file for `<img>` tags lacking an `alt`
//! attribute, and reports success or failure back to the pipeline.
//!
//! ```text
//! CodePipeline job → artifact (S3 zip) → scanner → auditor → notifier
//! ```
//!
//! The scan is deliberately shallow: it stops at the first offending file
//! and the first offending tag within it.

pub mod artifact;
pub mod auditor;
pub mod config;
pub mod error;
pub mod notifier;
pub mod pipeline;
pub mod report;
pub mod scanner;

pub use config::Config;
pub use error::{AltbotError, Result};
