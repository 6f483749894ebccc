//! Standup Server - check-in bot HTTP server binary.

use std::process::ExitCode;

use clap::Parser;
use standup_slack::BotConfig;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use standup_server::{ServerConfig, run_with_shutdown};

/// Slack check-in bot server
#[derive(Parser)]
#[command(name = "standup-server")]
#[command(about = "HTTP server for the Slack check-in bot")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address (overrides STANDUP_LISTEN_ADDR and PORT)
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn shutdown_signal(shutdown_timeout: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }

    info!(
        "Waiting up to {}s for in-flight requests to complete...",
        shutdown_timeout
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);

    let bot = match BotConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid bot configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut config = if let Some(config_path) = args.config {
        match ServerConfig::load(&config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config from {}: {}", config_path, e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        match ServerConfig::from_env() {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config from environment: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    info!(channel = bot.main_channel(), admins = bot.admins().len(), "Bot configured");
    info!("Press Ctrl+C to stop");

    let shutdown_timeout = config.shutdown_timeout;
    let shutdown = async move {
        shutdown_signal(shutdown_timeout).await;
    };

    if let Err(e) = run_with_shutdown(config, bot, shutdown).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}
