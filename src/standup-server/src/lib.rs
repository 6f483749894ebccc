//! Standup Server - HTTP front end for the Slack check-in bot.
//!
//! This crate provides:
//! - The Slack Events API callback (`/slack/events`)
//! - Admin endpoints to open, close and remind a check-in
//! - Slack connectivity checks and a channel listing
//! - A health check

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod api;
pub mod config;
pub mod error;
pub mod state;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use standup_slack::BotConfig;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::ServerConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Run the server with the given configuration.
pub async fn run(config: ServerConfig, bot: BotConfig) -> anyhow::Result<()> {
    run_with_shutdown(config, bot, std::future::pending()).await
}

/// Run the server with graceful shutdown support.
pub async fn run_with_shutdown<F>(
    config: ServerConfig,
    bot: BotConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState::new(config.clone(), &bot)?);

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Starting check-in server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    serve(state, listener, shutdown).await
}

/// Serve on `listener` until `shutdown` resolves.
///
/// Once the signal fires, open connections and in-flight event handlers
/// share one `shutdown_timeout` budget. Whatever is still running after that
/// is abandoned.
pub async fn serve<F>(
    state: Arc<AppState>,
    listener: TcpListener,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let grace = Duration::from_secs(state.config.shutdown_timeout);
    let app = create_router_with_state(Arc::clone(&state));

    let (signalled_tx, signalled_rx) = oneshot::channel();
    let shutdown = async move {
        shutdown.await;
        let _ = signalled_tx.send(Instant::now());
    };
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .into_future(),
    );

    let signalled = tokio::select! {
        joined = &mut server => {
            joined??;
            None
        }
        Ok(at) = signalled_rx => Some(at),
    };
    let deadline = signalled.unwrap_or_else(Instant::now) + grace;

    if signalled.is_some() {
        match tokio::time::timeout_at(deadline, &mut server).await {
            Ok(joined) => joined??,
            Err(_) => {
                warn!("Connections still open after {}s, closing them", grace.as_secs());
                server.abort();
            }
        }
    }

    state.events.close();
    if tokio::time::timeout_at(deadline, state.events.wait())
        .await
        .is_err()
    {
        warn!(
            in_flight = state.events.len(),
            "Abandoning event handlers still running after {}s",
            grace.as_secs()
        );
    }

    info!("Server shut down");
    Ok(())
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    create_router_with_state(Arc::new(state))
}

/// Create the application router with an Arc-wrapped state.
pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_size;

    api::routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
