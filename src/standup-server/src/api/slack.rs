//! Slack connectivity diagnostics.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use standup_slack::ChannelInfo;
use tracing::{error, info};

use crate::error::AppResult;
use crate::state::AppState;

/// `GET /slack/test`: call `api.test` and log the answer.
pub async fn test_success(State(state): State<Arc<AppState>>) -> &'static str {
    match state.client.test_api(None).await {
        Ok(()) => info!("api.test succeeded"),
        Err(e) => error!("api.test failed: {}", e),
    }
    "Tested Success"
}

/// `GET /slack/test-error`: ask `api.test` to echo an error back.
pub async fn test_error(State(state): State<Arc<AppState>>) -> &'static str {
    match state.client.test_api(Some("test_error")).await {
        Ok(()) => error!("api.test did not return the requested error"),
        Err(e) => info!("api.test returned error as requested: {}", e),
    }
    "Tested Error"
}

/// `GET /slack/channels`: rebuild the channel directory and list it.
pub async fn list_channels(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<ChannelInfo>>> {
    let channels = state.resolver.force_refresh().await.map_err(|e| {
        error!("Failed to refresh channel directory: {}", e);
        e
    })?;
    Ok(Json(channels))
}
