use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod retention;

use config::{ConfigOverrides, RetentionConfig};
use engine::CliEngine;
use retention::RetentionPlan;

/// Tag each tracked image's `latest` with a timestamp and prune old timestamp tags
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a retention.toml (defaults to ./retention.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Container CLI to use (docker or podman)
    #[arg(long)]
    container_cli: Option<String>,

    /// Number of timestamp tags to keep per component
    #[arg(long)]
    keep: Option<usize>,
}

fn resolve_config(cli: &Cli) -> Result<RetentionConfig> {
    let file = config::load_retention_file(cli.config.as_deref())?;
    let overrides = ConfigOverrides {
        container_cli: cli.container_cli.clone(),
        keep: cli.keep,
    };
    RetentionConfig::resolve(file, &overrides)
}

fn main() {
    // Logs go to stderr; stdout carries only the status lines
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = resolve_config(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    });
    debug!("Resolved configuration: {:?}", config);

    // Timestamp is captured once and shared by every component
    let plan = RetentionPlan::new(&config, chrono::Local::now());

    let engine = CliEngine::new(config.container_cli.clone());
    if let Err(e) = engine.check_available() {
        let code = e.exit_code();
        eprintln!("Error: {:#}", anyhow::Error::new(e));
        std::process::exit(code);
    }
    debug!("Using container CLI: {}", engine.container_cli());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = retention::run(&engine, &plan, &mut out) {
        let code = e.exit_code();
        eprintln!("Error: {:#}", anyhow::Error::new(e));
        std::process::exit(code);
    }
}
