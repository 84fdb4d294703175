mod config;
mod pipeline;
mod provider;
mod retry;
mod speedtest;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use crate::pipeline::{Pipeline, RunOutcome};

#[derive(Parser, Debug)]
#[command(name = "dnscf")]
#[command(about = "Points Cloudflare A records at the current best edge IPs")]
struct Args {
    /// Optional TOML file overriding endpoints, retry and record settings
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logger init)
    let config = config::Config::load_or_default(args.config.as_deref())?;

    // Initialize logger with config log level (env var takes precedence)
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log.level)
    ).init();

    if let Some(path) = &args.config {
        info!("Loaded configuration from: {}", path.display());
    }

    let credentials = config::Credentials::from_env()?;
    info!("Target record: {} (zone {})", credentials.dns_name, credentials.zone_id);

    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let pipeline = Pipeline::new(client, &config, &credentials);
    match pipeline.run().await {
        RunOutcome::Updated { attempted, succeeded, .. } => {
            info!("Run finished: {}/{} record update(s) succeeded", succeeded, attempted);
        }
        outcome => warn!("Run stopped early: {:?}", outcome),
    }

    Ok(())
}
