//! Shared application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use standup_slack::{
    BotConfig, CheckinSession, EventDispatcher, PlatformClient, RosterResolver, SlackApiClient,
};
use tokio_util::task::TaskTracker;

use crate::config::ServerConfig;
use crate::error::AppResult;

/// State handed to every handler.
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,
    /// Routes callbacks and admin commands into the session.
    pub dispatcher: Arc<EventDispatcher>,
    /// Channel directory and member lookups.
    pub resolver: Arc<RosterResolver>,
    /// Slack Web API.
    pub client: Arc<dyn PlatformClient>,
    /// Event handlers running after their callback was acknowledged.
    pub events: TaskTracker,
    start_time: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("events_in_flight", &self.events.len())
            .field("start_time", &self.start_time)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the state with a live Slack client.
    pub fn new(config: ServerConfig, bot: &BotConfig) -> AppResult<Self> {
        let client: Arc<dyn PlatformClient> = Arc::new(SlackApiClient::new(bot)?);
        Ok(Self::with_client(config, bot, client))
    }

    /// Build the state around an existing platform client.
    pub fn with_client(
        config: ServerConfig,
        bot: &BotConfig,
        client: Arc<dyn PlatformClient>,
    ) -> Self {
        let resolver = Arc::new(RosterResolver::new(Arc::clone(&client)));
        let session = Arc::new(CheckinSession::new(
            Arc::clone(&client),
            Arc::clone(&resolver),
            bot.bot_name(),
        ));
        let dispatcher = Arc::new(EventDispatcher::new(bot, session, Arc::clone(&client)));

        Self {
            config,
            dispatcher,
            resolver,
            client,
            events: TaskTracker::new(),
            start_time: Instant::now(),
        }
    }

    /// The check-in session.
    pub fn session(&self) -> &Arc<CheckinSession> {
        self.dispatcher.session()
    }

    /// Get server uptime.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
