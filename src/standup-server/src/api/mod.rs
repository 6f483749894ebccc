//! HTTP routes and handlers.

mod checkin;
mod events;
mod health;
mod slack;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub use checkin::ActorForm;
pub use health::HealthResponse;

/// Create the API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Slack callbacks and diagnostics
        .route("/slack/events", post(events::handle_events))
        .route("/slack/test", get(slack::test_success))
        .route("/slack/test-error", get(slack::test_error))
        .route("/slack/channels", get(slack::list_channels))
        // Admin commands
        .route("/checkin/open", post(checkin::open))
        .route("/checkin/close", post(checkin::close))
        .route("/checkin/remind", post(checkin::remind))
        .route("/checkin/status", get(checkin::status))
}
