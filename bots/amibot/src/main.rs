// SPDX-License-Identifier: PMPL-1.0-or-later
//! Amibot Lambda entry point

use amibot::config::{LogConfig, LogFormat};
use amibot::event::CustomResourceEvent;
use amibot::handler::ResourceHandler;
use amibot::images::{Ec2ImageService, ImageLifecycle};
use amibot::response::HttpResponseSender;
use amibot::Config;
use clap::Parser;
use lambda_runtime::{service_fn, LambdaEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// AMI lifecycle custom resource for CloudFormation
#[derive(Parser)]
#[command(name = "amibot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML or YAML)
    #[arg(short, long, env = "AMIBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(log: &LogConfig, verbose: bool) {
    let level = if verbose { "debug" } else { log.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("amibot={}", level)));

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
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config.log, cli.verbose);

    let lifecycle = ImageLifecycle::new(Ec2ImageService::from_env(), config.image, config.wait);
    let log_stream = std::env::var("AWS_LAMBDA_LOG_STREAM_NAME").ok();
    let handler = Arc::new(ResourceHandler::new(
        lifecycle,
        HttpResponseSender::default(),
        log_stream,
    ));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<CustomResourceEvent>| {
        let handler = Arc::clone(&handler);
        async move {
            let response = handler.handle(&event.payload).await?;
            Ok::<_, lambda_runtime::Error>(serde_json::to_value(response)?)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}
