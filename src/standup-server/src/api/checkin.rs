//! Admin endpoints that drive the check-in session.
//!
//! Callers post a form with an optional `actor_id`. An empty actor is a
//! trusted internal trigger; a non-empty one must be a configured admin.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, State};
use serde::Deserialize;
use standup_slack::{AdminReply, Command, SessionStatus};
use tracing::error;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Form body of an admin command.
#[derive(Debug, Default, Deserialize)]
pub struct ActorForm {
    #[serde(default)]
    pub actor_id: String,
}

/// `POST /checkin/open`
pub async fn open(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ActorForm>,
) -> AppResult<String> {
    run(&state, Command::Open, &form.actor_id).await
}

/// `POST /checkin/close`
pub async fn close(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ActorForm>,
) -> AppResult<String> {
    run(&state, Command::Close, &form.actor_id).await
}

/// `POST /checkin/remind`
pub async fn remind(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ActorForm>,
) -> AppResult<String> {
    run(&state, Command::Remind, &form.actor_id).await
}

/// `GET /checkin/status`
pub async fn status(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    Json(state.session().status().await)
}

async fn run(state: &AppState, command: Command, actor_id: &str) -> AppResult<String> {
    match state.dispatcher.admin_command(command, actor_id).await {
        Ok(AdminReply::Done(text)) => Ok(text),
        Ok(AdminReply::Denied(text)) => Err(AppError::Authorization(text)),
        Err(e) => {
            error!(?command, "Admin command failed: {}", e);
            Err(e.into())
        }
    }
}
