//! Slack check-in bot core.
//!
//! This crate runs an asynchronous daily check-in:
//! - an admin opens a session for the main channel's members
//! - every member is asked for an update by direct message
//! - each member's first reply is relayed into the summary thread
//! - closing the session reports who never answered
//!
//! # Architecture
//!
//! - [`EventDispatcher`] decodes inbound Slack payloads and admin commands
//! - [`CheckinSession`] owns the single open/closed session behind a mutex
//! - [`RosterResolver`] maps the channel name to an ID and lists members
//! - [`AdminSet`] gates session-mutating commands
//! - [`PlatformClient`] is the Slack Web API seam ([`SlackApiClient`])
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use standup_slack::{BotConfig, CheckinSession, EventDispatcher, RosterResolver, SlackApiClient};
//!
//! let config = BotConfig::from_env()?;
//! let client = Arc::new(SlackApiClient::new(&config)?);
//! let resolver = Arc::new(RosterResolver::new(client.clone()));
//! let session = Arc::new(CheckinSession::new(client.clone(), resolver, config.bot_name()));
//! let dispatcher = EventDispatcher::new(&config, session, client);
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod messages;
pub mod roster;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{AdminSet, Authorization};
pub use client::{ChannelInfo, PlatformClient, SlackApiClient};
pub use config::{BotConfig, Triggers};
pub use dispatcher::{AdminReply, Command, CommandReply, Delivery, DispatchOutcome, EventDispatcher};
pub use error::{SlackError, SlackResult};
pub use events::{InboundPayload, SlackEvent};
pub use roster::{ChannelDirectory, RosterResolver};
pub use session::{
    CheckinSession, CloseOutcome, MainChannel, OpenOutcome, RemindOutcome, ResponseOutcome,
    SessionStatus,
};
