//! Configuration for the check-in bot.
//!
//! Loaded once at startup from environment variables. A missing bot token or
//! main channel name is fatal.

use std::collections::HashSet;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SlackError, SlackResult};

/// Default Slack Web API base URL.
pub const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Display name used for the bot when none is configured.
pub const DEFAULT_BOT_NAME: &str = "standup";

/// Mention substrings that trigger session commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triggers {
    /// Opens a check-in.
    pub open: Option<String>,
    /// Closes the open check-in.
    pub close: Option<String>,
    /// Reminds members who have not responded.
    pub remind: Option<String>,
}

/// Configuration for the check-in bot.
#[derive(Clone)]
pub struct BotConfig {
    /// Bot OAuth token (xoxb-...).
    bot_token: SecretString,
    /// Name of the channel whose members form the roster.
    main_channel: String,
    /// Pinned channel ID, skipping name resolution when set.
    main_channel_id: Option<String>,
    /// Member IDs allowed to mutate the session.
    admins: HashSet<String>,
    /// The bot's own display name.
    bot_name: String,
    triggers: Triggers,
    /// Appended to successful admin confirmations.
    admin_suffix: String,
    api_url: String,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"[REDACTED]")
            .field("main_channel", &self.main_channel)
            .field("main_channel_id", &self.main_channel_id)
            .field("admins", &self.admins)
            .field("bot_name", &self.bot_name)
            .field("triggers", &self.triggers)
            .field("admin_suffix", &self.admin_suffix)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl BotConfig {
    /// Create a configuration with the two required settings.
    pub fn new(bot_token: impl Into<String>, main_channel: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::new(bot_token.into().into()),
            main_channel: main_channel.into(),
            main_channel_id: None,
            admins: HashSet::new(),
            bot_name: DEFAULT_BOT_NAME.to_string(),
            triggers: Triggers::default(),
            admin_suffix: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Pin the main channel ID.
    pub fn with_main_channel_id(mut self, id: impl Into<String>) -> Self {
        self.main_channel_id = Some(id.into());
        self
    }

    /// Set the admin member IDs.
    pub fn with_admins<I, S>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admins = admins.into_iter().map(Into::into).collect();
        self
    }

    /// Set the bot's display name.
    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    /// Set the mention triggers.
    pub fn with_triggers(mut self, triggers: Triggers) -> Self {
        self.triggers = triggers;
        self
    }

    /// Set the admin confirmation suffix.
    pub fn with_admin_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.admin_suffix = suffix.into();
        self
    }

    /// Override the Slack API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `SLACK_BOT_TOKEN`
    /// - `STANDUP_MAIN_CHANNEL`
    ///
    /// Optional variables:
    /// - `STANDUP_MAIN_CHANNEL_ID`
    /// - `STANDUP_ADMINS` (comma separated)
    /// - `STANDUP_BOT_NAME`
    /// - `STANDUP_OPEN_TRIGGER`, `STANDUP_CLOSE_TRIGGER`, `STANDUP_REMIND_TRIGGER`
    /// - `STANDUP_ADMIN_SUFFIX`
    /// - `SLACK_API_URL`
    pub fn from_env() -> SlackResult<Self> {
        let bot_token = std::env::var("SLACK_BOT_TOKEN")
            .map_err(|_| SlackError::Config("SLACK_BOT_TOKEN not set".to_string()))?;

        let main_channel = std::env::var("STANDUP_MAIN_CHANNEL")
            .map_err(|_| SlackError::Config("STANDUP_MAIN_CHANNEL not set".to_string()))?;

        if !bot_token.starts_with("xoxb-") {
            warn!("Bot token doesn't start with 'xoxb-', this may be incorrect");
        }

        let mut config = Self::new(bot_token, main_channel);

        if let Some(id) = non_empty_var("STANDUP_MAIN_CHANNEL_ID") {
            config = config.with_main_channel_id(id);
        }
        if let Some(admins) = non_empty_var("STANDUP_ADMINS") {
            config = config.with_admins(parse_admins(&admins));
        }
        if let Some(name) = non_empty_var("STANDUP_BOT_NAME") {
            config = config.with_bot_name(name);
        }
        if let Some(suffix) = non_empty_var("STANDUP_ADMIN_SUFFIX") {
            config = config.with_admin_suffix(suffix);
        }
        if let Some(url) = non_empty_var("SLACK_API_URL") {
            config = config.with_api_url(url);
        }

        config = config.with_triggers(Triggers {
            open: non_empty_var("STANDUP_OPEN_TRIGGER"),
            close: non_empty_var("STANDUP_CLOSE_TRIGGER"),
            remind: non_empty_var("STANDUP_REMIND_TRIGGER"),
        });

        config.validate()?;
        Ok(config)
    }

    /// Get the bot token.
    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    /// Get the main channel name.
    pub fn main_channel(&self) -> &str {
        &self.main_channel
    }

    /// Get the pinned main channel ID.
    pub fn main_channel_id(&self) -> Option<&str> {
        self.main_channel_id.as_deref()
    }

    /// Get the admin member IDs.
    pub fn admins(&self) -> &HashSet<String> {
        &self.admins
    }

    /// Get the bot's display name.
    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    /// Get the mention triggers.
    pub fn triggers(&self) -> &Triggers {
        &self.triggers
    }

    /// Get the admin confirmation suffix.
    pub fn admin_suffix(&self) -> &str {
        &self.admin_suffix
    }

    /// Get the Slack API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SlackResult<()> {
        if self.bot_token.expose_secret().trim().is_empty() {
            return Err(SlackError::Config("Bot token is empty".to_string()));
        }
        if self.main_channel.trim().is_empty() {
            return Err(SlackError::Config("Main channel name is empty".to_string()));
        }
        if self.bot_name.trim().is_empty() {
            return Err(SlackError::Config("Bot name is empty".to_string()));
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma separated admin list, dropping blanks.
pub fn parse_admins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
