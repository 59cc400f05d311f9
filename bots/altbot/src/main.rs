// SPDX-License-Identifier: PMPL-1.0-or-later
//! Altbot CLI and Lambda entry point
//!
//! With no subcommand the binary serves CodePipeline invocations through the
//! Lambda runtime. `check` and `scan` run the same audit locally and print
//! a report; `invoke` replays a saved job event and prints what would have
//! been reported to the pipeline.

use altbot::artifact::{ArtifactLocation, LocalObjectStore, ObjectStore, S3ObjectStore};
use altbot::config::{AuditMode, LogConfig, LogFormat};
use altbot::notifier::{CodePipelineNotifier, ConsoleNotifier};
use altbot::pipeline::{AccessibilityCheck, CodePipelineEvent, JobReport};
use altbot::report::{generate_report, OutputFormat};
use altbot::{auditor, scanner, Config};
use clap::{Parser, Subcommand, ValueEnum};
use lambda_runtime::{service_fn, LambdaEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exit code when the artifact is not compliant
const EXIT_NOT_COMPLIANT: i32 = 1;
/// Exit code when the check itself could not run
const EXIT_CHECK_ERROR: i32 = 2;

/// Image alt text gate for CodePipeline
#[derive(Parser)]
#[command(name = "altbot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (TOML or YAML)
    #[arg(short, long, global = true, env = "ALTBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an artifact archive and audit it
    Check {
        /// Bucket holding the artifact
        bucket: String,

        /// Object key of the zip archive
        key: String,

        /// Read `<DIR>/<bucket>/<key>` from disk instead of S3
        #[arg(long, value_name = "DIR")]
        local_store: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,
    },

    /// Audit an already expanded directory
    Scan {
        /// Directory to scan
        dir: PathBuf,

        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,

        /// Parse HTML instead of matching literals
        #[arg(long)]
        structural: bool,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,
    },

    /// Run a saved CodePipeline job event, printing the job outcome
    Invoke {
        /// JSON file holding the invocation payload
        event: PathBuf,

        /// Read `<DIR>/<bucket>/<key>` from disk instead of S3
        #[arg(long, value_name = "DIR")]
        local_store: Option<PathBuf>,
    },

    /// Serve CodePipeline invocations (the default)
    Lambda,
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(log: &LogConfig, verbose: bool) {
    let level = if verbose { "debug" } else { log.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("altbot={}", level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Accessibility check could not run: {:#}", e);
            EXIT_CHECK_ERROR
        }
    };
    std::process::exit(code);
}

/// Exit code for a finished audit
fn verdict_code(compliant: bool) -> i32 {
    if compliant {
        0
    } else {
        EXIT_NOT_COMPLIANT
    }
}

/// Run the selected command; any error means the check could not run
async fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = Config::load(cli.config.as_deref())?;
    init_logging(&config.log, cli.verbose);

    match cli.command.unwrap_or(Commands::Lambda) {
        Commands::Check { bucket, key, local_store, format } => {
            let location = ArtifactLocation::new(bucket, key);
            match local_store {
                Some(root) => check(LocalObjectStore::new(root), &location, config, format.into()).await,
                None => check(S3ObjectStore::from_env(), &location, config, format.into()).await,
            }
        }

        Commands::Scan { dir, recursive, structural, format } => {
            config.scan.recursive |= recursive;
            if structural {
                config.scan.mode = AuditMode::Structural;
            }
            let auditor = auditor::from_config(&config.scan)?;
            let outcome = scanner::scan_directory(&dir, &config.scan, auditor.as_ref())?;
            println!("{}", generate_report(&outcome, format.into()));
            Ok(verdict_code(outcome.is_compliant()))
        }

        Commands::Invoke { event, local_store } => {
            let payload = std::fs::read_to_string(&event)?;
            let event: CodePipelineEvent = serde_json::from_str(&payload)?;
            let report = match local_store {
                Some(root) => invoke(LocalObjectStore::new(root), config, &event).await?,
                None => invoke(S3ObjectStore::from_env(), config, &event).await?,
            };
            if report.check_failed {
                Ok(EXIT_CHECK_ERROR)
            } else {
                Ok(verdict_code(report.compliant))
            }
        }

        Commands::Lambda => {
            run_lambda(config).await?;
            Ok(0)
        }
    }
}

/// Fetch and audit one artifact, printing the report
async fn check<S: ObjectStore>(
    store: S,
    location: &ArtifactLocation,
    config: Config,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let check = AccessibilityCheck::new(store, config)?;
    let outcome = check.assess(location).await?;
    println!("{}", generate_report(&outcome, format));
    Ok(verdict_code(outcome.is_compliant()))
}

async fn invoke<S: ObjectStore>(
    store: S,
    config: Config,
    event: &CodePipelineEvent,
) -> anyhow::Result<JobReport> {
    let check = AccessibilityCheck::new(store, config)?;
    Ok(check.handle_event(&ConsoleNotifier::stdout(), event).await?)
}

async fn run_lambda(config: Config) -> anyhow::Result<()> {
    let check = Arc::new(AccessibilityCheck::new(S3ObjectStore::from_env(), config)?);
    let notifier = Arc::new(CodePipelineNotifier::from_env());

    lambda_runtime::run(service_fn(move |event: LambdaEvent<CodePipelineEvent>| {
        let check = Arc::clone(&check);
        let notifier = Arc::clone(&notifier);
        async move {
            let report = check.handle_event(notifier.as_ref(), &event.payload).await?;
            Ok::<String, lambda_runtime::Error>(report.message)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}
