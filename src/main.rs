mod config;
mod dispatch;
mod links;
mod platform;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LoggingConfig};
use crate::links::LinkRewriter;

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_layer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // An explicit path must exist; the default one is optional.
    let explicit_path = std::env::args().nth(1).map(PathBuf::from);
    let required = explicit_path.is_some();
    let config_path = explicit_path.unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path, required)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    init_logging(&config.logging)?;

    info!("Configuration loaded successfully");
    info!("  Canonical host: {}", config.rewrite.canonical_host);
    info!("  Alias hosts: {:?}", config.rewrite.alias_hosts);
    info!("  Stripped params: {:?}", config.rewrite.strip_params);
    if let Some(file) = &config.logging.file {
        info!("  Log file: {}", file.display());
    }

    let rewriter = LinkRewriter::new(&config.rewrite)?;

    info!("Bot is starting...");
    if let Err(e) = platform::telegram::run(&config, rewriter).await {
        error!("Bot stopped: {:#}", e);
        return Err(e);
    }

    Ok(())
}
