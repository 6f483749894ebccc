//! Slack Events API callback.
//!
//! Slack wants an answer within three seconds, so only the verification
//! handshake is answered inline. Event callbacks are acknowledged with an
//! empty 200 and handled on a task tracked by [`AppState::events`], which
//! shutdown drains.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use standup_slack::Delivery;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header Slack sets when it re-delivers an event it thinks we missed.
const RETRY_HEADER: &str = "x-slack-retry-num";

/// Handle `POST /slack/events`.
pub async fn handle_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> AppResult<String> {
    let event = match state.dispatcher.accept(&body) {
        Ok(Delivery::Reply(reply)) => return Ok(reply),
        Ok(Delivery::Deferred(event)) => event,
        Err(e) => {
            warn!("Rejected malformed event payload: {}", e);
            return Err(AppError::BadRequest(e.to_string()));
        }
    };

    // Deliveries are at-most-once: the first attempt was already accepted.
    if let Some(retry) = headers.get(RETRY_HEADER) {
        info!(?retry, "Dropping redelivered event");
        return Ok(String::new());
    }

    let dispatcher = Arc::clone(&state.dispatcher);
    state.events.spawn(async move {
        let outcome = dispatcher.handle(event).await;
        debug!(?outcome, "Event handled");
    });

    Ok(String::new())
}
