//! The check-in session state machine.
//!
//! ```text
//!   IDLE --open--> OPEN --close--> IDLE
//!                  |  ^
//!                  +--+ record_response / remind
//! ```
//!
//! Exactly one session exists per process. All state lives behind a single
//! async mutex; transitions and pending-set updates happen under it, so two
//! racing replies from the same member can never both be recorded. Outbound
//! posts that follow a transition are fire-and-forget: failures are logged
//! and never roll the transition back.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::PlatformClient;
use crate::config::BotConfig;
use crate::error::SlackResult;
use crate::messages;
use crate::roster::RosterResolver;

/// Where the roster comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainChannel {
    /// Resolve by display name through the channel directory.
    Name(String),
    /// Pinned channel ID.
    Id(String),
}

impl MainChannel {
    /// The pinned ID if configured, otherwise the channel name.
    pub fn from_config(config: &BotConfig) -> Self {
        match config.main_channel_id() {
            Some(id) => MainChannel::Id(id.to_string()),
            None => MainChannel::Name(config.main_channel().to_string()),
        }
    }
}

/// Result of [`CheckinSession::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new session is collecting responses.
    Opened {
        channel_id: String,
        thread_ts: String,
        roster_size: usize,
    },
    /// A session was already open; nothing changed.
    AlreadyOpen,
}

/// Result of [`CheckinSession::record_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// First reply from a pending member, relayed to the thread.
    Recorded,
    /// Sender is not on the roster of an open session.
    NotInSession,
    /// Sender already answered this session.
    AlreadyResponded,
}

/// Result of [`CheckinSession::remind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemindOutcome {
    /// Reminders were sent to this many pending members.
    Reminded(usize),
    /// There is no open session.
    NoOpenSession,
}

/// Result of [`CheckinSession::close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The session closed; `missing` holds non-responders in roster order.
    Closed { missing: Vec<String> },
    /// There was nothing to close.
    NothingToClose,
}

/// Snapshot of the session for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_on: Option<NaiveDate>,
    pub roster_size: usize,
    pub pending: Vec<String>,
}

struct OpenSession {
    channel_id: String,
    thread_ts: String,
    opened_on: NaiveDate,
    /// Roster in channel order; never shrinks while open.
    roster: Vec<String>,
    names: HashMap<String, String>,
    /// Members who have not answered yet.
    pending: HashSet<String>,
}

impl OpenSession {
    fn name_of(&self, member_id: &str) -> String {
        self.names
            .get(member_id)
            .cloned()
            .unwrap_or_else(|| member_id.to_string())
    }

    fn pending_in_order(&self) -> Vec<String> {
        self.roster
            .iter()
            .filter(|m| self.pending.contains(*m))
            .cloned()
            .collect()
    }
}

enum SessionState {
    Idle,
    Open(OpenSession),
}

/// Owns the single check-in session.
pub struct CheckinSession {
    client: Arc<dyn PlatformClient>,
    resolver: Arc<RosterResolver>,
    bot_name: String,
    state: Mutex<SessionState>,
}

impl CheckinSession {
    /// Create an idle session.
    pub fn new(
        client: Arc<dyn PlatformClient>,
        resolver: Arc<RosterResolver>,
        bot_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            resolver,
            bot_name: bot_name.into(),
            state: Mutex::new(SessionState::Idle),
        }
    }

    /// The bot's own display name.
    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    /// Open a check-in dated today.
    pub async fn open(&self, channel: &MainChannel) -> SlackResult<OpenOutcome> {
        self.open_on(channel, chrono::Local::now().date_naive())
            .await
    }

    /// Open a check-in tagged with `date`.
    ///
    /// Re-opening while a session is open is refused. Resolution failures
    /// abort before anything is posted and leave the session idle.
    pub async fn open_on(&self, channel: &MainChannel, date: NaiveDate) -> SlackResult<OpenOutcome> {
        let mut state = self.state.lock().await;
        if let SessionState::Open(current) = &*state {
            info!(
                thread = %current.thread_ts,
                "Refusing to open a check-in while one is already open"
            );
            return Ok(OpenOutcome::AlreadyOpen);
        }

        let channel_id = match channel {
            MainChannel::Id(id) => id.clone(),
            MainChannel::Name(name) => self.resolver.resolve_channel(name).await.map_err(|e| {
                error!("Failed to resolve channel {}: {}", name, e);
                e
            })?,
        };

        let members = self
            .resolver
            .resolve_members(&channel_id)
            .await
            .map_err(|e| {
                error!("Failed to list members of {}: {}", channel_id, e);
                e
            })?;

        let mut roster = Vec::with_capacity(members.len());
        let mut names = HashMap::with_capacity(members.len());
        for member in members {
            let name = match self.client.display_name(&member).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(member = %member, "Could not resolve display name: {}", e);
                    member.clone()
                }
            };
            if name == self.bot_name {
                debug!(member = %member, "Leaving the bot off the roster");
                continue;
            }
            if names.insert(member.clone(), name).is_none() {
                roster.push(member);
            }
        }

        let thread_ts = self
            .client
            .post_message(&channel_id, &messages::summary(date), None)
            .await
            .map_err(|e| {
                error!("Failed to post check-in summary to {}: {}", channel_id, e);
                e
            })?;

        let request = messages::checkin_request(date);
        for member in &roster {
            if let Err(e) = self.client.send_direct_message(member, &request).await {
                warn!(member = %member, "Failed to send check-in request: {}", e);
            }
        }

        let roster_size = roster.len();
        info!(
            channel = %channel_id,
            thread = %thread_ts,
            roster_size,
            "Check-in opened"
        );

        *state = SessionState::Open(OpenSession {
            channel_id: channel_id.clone(),
            thread_ts: thread_ts.clone(),
            opened_on: date,
            pending: roster.iter().cloned().collect(),
            roster,
            names,
        });

        Ok(OpenOutcome::Opened {
            channel_id,
            thread_ts,
            roster_size,
        })
    }

    /// Record a member's reply. Only the first reply from a pending member
    /// counts; everything else is declined with a private notice.
    ///
    /// The relay is posted while the session is still locked, so a racing
    /// close cannot report the thread as closed before the reply lands in it.
    pub async fn record_response(&self, member_id: &str, text: &str) -> ResponseOutcome {
        let outcome = {
            let mut state = self.state.lock().await;
            match &mut *state {
                SessionState::Idle => ResponseOutcome::NotInSession,
                SessionState::Open(session) => {
                    if !session.names.contains_key(member_id) {
                        ResponseOutcome::NotInSession
                    } else if session.pending.remove(member_id) {
                        info!(member = member_id, "Recorded check-in response");
                        let relay = messages::relayed_response(&session.name_of(member_id), text);
                        if let Err(e) = self
                            .client
                            .post_message(&session.channel_id, &relay, Some(&session.thread_ts))
                            .await
                        {
                            warn!(member = member_id, "Failed to relay response: {}", e);
                        }
                        ResponseOutcome::Recorded
                    } else {
                        ResponseOutcome::AlreadyResponded
                    }
                }
            }
        };

        match outcome {
            ResponseOutcome::Recorded => {
                self.notify(member_id, messages::response_ack()).await;
            }
            ResponseOutcome::NotInSession => {
                debug!(member = member_id, "Reply from outside the open check-in");
                self.notify(member_id, messages::not_in_session()).await;
            }
            ResponseOutcome::AlreadyResponded => {
                debug!(member = member_id, "Duplicate check-in reply");
                self.notify(member_id, messages::already_responded()).await;
            }
        }
        outcome
    }

    /// Remind every pending member, in roster order.
    pub async fn remind(&self) -> RemindOutcome {
        let pending = {
            let state = self.state.lock().await;
            match &*state {
                SessionState::Idle => {
                    debug!("Remind requested with no open check-in");
                    return RemindOutcome::NoOpenSession;
                }
                SessionState::Open(session) => session.pending_in_order(),
            }
        };

        for member in &pending {
            self.notify(member, messages::reminder()).await;
        }

        info!(count = pending.len(), "Sent check-in reminders");
        RemindOutcome::Reminded(pending.len())
    }

    /// Close the session and report who never answered.
    pub async fn close(&self) -> CloseOutcome {
        let session = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, SessionState::Idle) {
                SessionState::Idle => {
                    debug!("Close requested with no open check-in");
                    return CloseOutcome::NothingToClose;
                }
                SessionState::Open(session) => session,
            }
        };

        let missing: Vec<String> = session
            .pending_in_order()
            .into_iter()
            .filter(|m| session.name_of(m) != self.bot_name)
            .collect();
        let missing_names: Vec<String> = missing.iter().map(|m| session.name_of(m)).collect();

        if let Err(e) = self
            .client
            .post_message(
                &session.channel_id,
                &messages::closing(&missing_names),
                Some(&session.thread_ts),
            )
            .await
        {
            warn!(channel = %session.channel_id, "Failed to post closing message: {}", e);
        }

        info!(
            thread = %session.thread_ts,
            missing = missing.len(),
            "Check-in closed"
        );
        CloseOutcome::Closed { missing }
    }

    /// Current state, for status reporting.
    pub async fn status(&self) -> SessionStatus {
        let state = self.state.lock().await;
        match &*state {
            SessionState::Idle => SessionStatus {
                open: false,
                channel: None,
                thread: None,
                opened_on: None,
                roster_size: 0,
                pending: Vec::new(),
            },
            SessionState::Open(session) => SessionStatus {
                open: true,
                channel: Some(session.channel_id.clone()),
                thread: Some(session.thread_ts.clone()),
                opened_on: Some(session.opened_on),
                roster_size: session.roster.len(),
                pending: session.pending_in_order(),
            },
        }
    }

    /// Whether a session is open.
    pub async fn is_open(&self) -> bool {
        matches!(&*self.state.lock().await, SessionState::Open(_))
    }

    async fn notify(&self, member_id: &str, text: &str) {
        if let Err(e) = self.client.send_direct_message(member_id, text).await {
            warn!(member = member_id, "Failed to send direct message: {}", e);
        }
    }
}
