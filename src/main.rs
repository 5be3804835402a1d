use anyhow::{Context, Result};
use clap::Parser;
use linkedin_insights::cli::{handle_command, Cli};
use linkedin_insights::config::ConfigManager;
use std::fs::OpenOptions;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = ConfigManager::file_path(cli.config.as_deref());
    let config = ConfigManager::load(config_path.as_deref())?;

    // Logs go to a file so stdout carries only command output.
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Clear file on startup
        .open(&config.logging.log_file)
        .with_context(|| {
            format!(
                "Failed to open log file {}",
                config.logging.log_file.display()
            )
        })?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(filter)
        .init();

    info!("Starting linkedin-insights");
    match &config_path {
        Some(path) => info!("Loaded configuration file: {}", path.display()),
        None => info!("No configuration file, using defaults and environment"),
    }
    info!("Configuration: {:?}", config);

    handle_command(cli.command, config).await
}
