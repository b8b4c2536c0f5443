//! vigild — the Vigil health-check daemon.
//!
//! Reads its settings from the environment (optionally seeded from a
//! `.env` file and a TOML file), then polls the health endpoint until it
//! receives Ctrl-C or SIGTERM.
//!
//! # Usage
//!
//! ```text
//! HEALTH_ENDPOINT=http://localhost:3000/health \
//! INTERVAL_SECONDS=60 \
//! PM2_COMMAND="pm2 restart app" \
//! WEBHOOK_URL=https://discord.com/api/webhooks/... \
//! vigild
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::{debug, error, info};

use vigil_core::MonitorConfig;
use vigil_health::HealthMonitor;

const DEFAULT_LOG_FILTER: &str = "info,vigild=debug,vigil_health=debug";

#[derive(Parser)]
#[command(
    name = "vigild",
    version,
    about = "Polls a health endpoint and runs a recovery command when it stays down"
)]
struct Cli {
    /// TOML file with base settings. Environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Existing environment variables win over the .env file.
    let dotenv_path = dotenvy::dotenv().ok();

    init_tracing(cli.log_format);

    if let Some(path) = dotenv_path {
        debug!(path = %path.display(), "loaded .env file");
    }

    let config = match MonitorConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Err(e).context("invalid configuration");
        }
    };

    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn run(config: MonitorConfig) -> anyhow::Result<()> {
    info!(
        endpoint = %config.endpoint,
        interval_ms = config.interval.map(|i| i.as_millis() as u64),
        retries = config.retries,
        command = config.command.as_deref(),
        webhook = config.webhook.is_some(),
        "vigil starting"
    );

    if !config.is_enabled() {
        info!("INTERVAL_SECONDS is 0 or unset, periodic health checking disabled");
        return Ok(());
    }

    let monitor = Arc::new(HealthMonitor::from_config(&config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handle = tokio::spawn(monitor.run(shutdown_rx));

    tokio::select! {
        _ = shutdown_signal() => {}
        res = &mut handle => {
            // The loop only returns on shutdown, so anything else is fatal.
            res.context("health monitor task failed")?;
            anyhow::bail!("health monitor stopped unexpectedly");
        }
    }
    let _ = shutdown_tx.send(true);

    handle.await.context("health monitor task failed")?;
    info!("vigil stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
