//! Routing of inbound Slack payloads and admin commands.
//!
//! The [`EventDispatcher`] is the single entry point for everything Slack
//! sends us. [`EventDispatcher::accept`] decodes a callback body and decides
//! what goes back on the wire:
//! - `url_verification` is answered with its challenge before anything else
//! - event callbacks are acknowledged empty and handed to
//!   [`EventDispatcher::handle`]
//! - unknown payloads are logged and acknowledged empty
//!
//! Handled events: direct messages become candidate check-in responses, and
//! `app_mention`s are matched against the configured triggers to run the
//! corresponding session command.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{AdminSet, Authorization};
use crate::client::PlatformClient;
use crate::config::{BotConfig, Triggers};
use crate::error::SlackResult;
use crate::events::{
    AppMentionEvent, InboundPayload, MessageEvent, SlackEvent, parse_payload, strip_mentions,
};
use crate::messages;
use crate::session::{
    CheckinSession, CloseOutcome, MainChannel, OpenOutcome, RemindOutcome, ResponseOutcome,
};

/// A session command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Remind,
}

impl Command {
    /// Pick the command whose trigger appears in `text`.
    ///
    /// Matching is case-insensitive. When several triggers match, the longest
    /// one wins; ties go to open, then close, then remind.
    pub fn from_text(triggers: &Triggers, text: &str) -> Option<Self> {
        let haystack = text.to_lowercase();
        [
            (Command::Open, triggers.open.as_deref()),
            (Command::Close, triggers.close.as_deref()),
            (Command::Remind, triggers.remind.as_deref()),
        ]
        .into_iter()
        .filter_map(|(command, trigger)| {
            let trigger = trigger?.trim().to_lowercase();
            (!trigger.is_empty() && haystack.contains(&trigger)).then_some((command, trigger.len()))
        })
        .fold(None, |best: Option<(Command, usize)>, (command, len)| match best {
            Some((_, best_len)) if best_len >= len => best,
            _ => Some((command, len)),
        })
        .map(|(command, _)| command)
    }

    fn verb(self) -> &'static str {
        match self {
            Command::Open => "open",
            Command::Close => "close",
            Command::Remind => "remind",
        }
    }
}

/// What a command run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Confirmation or notice text.
    pub text: String,
    /// Whether the command changed or acted on the session.
    pub succeeded: bool,
}

/// What to do with a decoded callback body.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Answer with this body; nothing is left to handle.
    Reply(String),
    /// Acknowledge with an empty body, then pass the event to
    /// [`EventDispatcher::handle`].
    Deferred(SlackEvent),
}

/// What happened to an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A direct message was handled as a check-in response.
    Response(ResponseOutcome),
    /// A mention ran a session command.
    Command(Command, CommandReply),
    /// A mention matched a trigger but the author is not an admin.
    Denied,
    /// A mention matched no trigger.
    NoTrigger,
    /// Payload intentionally ignored.
    Ignored(&'static str),
}

/// Result of an HTTP-triggered admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminReply {
    /// The command ran; text is ready for the caller.
    Done(String),
    /// The actor is not allowed to run commands.
    Denied(String),
}

/// Routes inbound events and commands to the session.
pub struct EventDispatcher {
    session: Arc<CheckinSession>,
    client: Arc<dyn PlatformClient>,
    admins: AdminSet,
    triggers: Triggers,
    main_channel: MainChannel,
    admin_suffix: String,
}

impl EventDispatcher {
    /// Build a dispatcher from the bot configuration.
    pub fn new(
        config: &BotConfig,
        session: Arc<CheckinSession>,
        client: Arc<dyn PlatformClient>,
    ) -> Self {
        Self {
            session,
            client,
            admins: AdminSet::new(config.admins().iter().cloned()),
            triggers: config.triggers().clone(),
            main_channel: MainChannel::from_config(config),
            admin_suffix: config.admin_suffix().to_string(),
        }
    }

    /// The session this dispatcher drives.
    pub fn session(&self) -> &Arc<CheckinSession> {
        &self.session
    }

    /// Decode a raw callback body.
    ///
    /// Only the verification handshake is answered here; it never touches
    /// the session and must work before any other setup.
    pub fn accept(&self, body: &str) -> SlackResult<Delivery> {
        match parse_payload(body)? {
            InboundPayload::UrlVerification { challenge } => {
                info!("Answering URL verification challenge");
                Ok(Delivery::Reply(challenge))
            }
            InboundPayload::EventCallback(event) => Ok(Delivery::Deferred(event)),
            InboundPayload::Unknown(kind) => {
                warn!("Ignoring payload type {}", kind);
                Ok(Delivery::Reply(String::new()))
            }
        }
    }

    /// Handle a decoded event.
    pub async fn handle(&self, event: SlackEvent) -> DispatchOutcome {
        match event {
            SlackEvent::Message(event) => self.handle_message(event).await,
            SlackEvent::AppMention(event) => self.handle_mention(event).await,
            SlackEvent::Unknown(kind) => {
                debug!("Ignoring event type {}", kind);
                DispatchOutcome::Ignored("unsupported event")
            }
        }
    }

    async fn handle_message(&self, event: MessageEvent) -> DispatchOutcome {
        if !event.is_plain_user_message() {
            return DispatchOutcome::Ignored("not a user message");
        }
        if !event.is_direct_message() {
            return DispatchOutcome::Ignored("not a direct message");
        }
        let Some(user) = event.user.as_deref() else {
            return DispatchOutcome::Ignored("no author");
        };

        match self.client.display_name(user).await {
            Ok(name) if name == self.session.bot_name() => {
                return DispatchOutcome::Ignored("own message");
            }
            Ok(_) => {}
            Err(e) => warn!(member = user, "Could not resolve message author: {}", e),
        }

        let text = event.text.trim();
        if text.is_empty() {
            return DispatchOutcome::Ignored("empty message");
        }

        DispatchOutcome::Response(self.session.record_response(user, text).await)
    }

    async fn handle_mention(&self, event: AppMentionEvent) -> DispatchOutcome {
        let text = strip_mentions(&event.text);
        let Some(command) = Command::from_text(&self.triggers, &text) else {
            debug!(member = %event.user, "Mention without a trigger");
            return DispatchOutcome::NoTrigger;
        };

        let thread = event.thread_ts.as_deref().unwrap_or(&event.ts);

        if !self.admins.is_admin(&event.user) {
            info!(member = %event.user, ?command, "Mention command from non-admin");
            self.reply(&event.channel, thread, messages::not_authorized())
                .await;
            return DispatchOutcome::Denied;
        }

        let reply = self.execute(command).await;
        self.reply(&event.channel, thread, &reply.text).await;
        DispatchOutcome::Command(command, reply)
    }

    /// Run a command against the session.
    ///
    /// Platform failures become a notice rather than an error so that
    /// mention-triggered runs can report them in-channel.
    pub async fn execute(&self, command: Command) -> CommandReply {
        match self.try_execute(command).await {
            Ok(reply) => reply,
            Err(e) => CommandReply {
                text: format!("Could not {} the check-in: {}", command.verb(), e),
                succeeded: false,
            },
        }
    }

    async fn try_execute(&self, command: Command) -> SlackResult<CommandReply> {
        let reply = match command {
            Command::Open => match self.session.open(&self.main_channel).await? {
                OpenOutcome::Opened { roster_size, .. } => CommandReply {
                    text: messages::opened(roster_size),
                    succeeded: true,
                },
                OpenOutcome::AlreadyOpen => CommandReply {
                    text: messages::already_open().to_string(),
                    succeeded: false,
                },
            },
            Command::Close => match self.session.close().await {
                CloseOutcome::Closed { missing } => CommandReply {
                    text: messages::closed(missing.len()),
                    succeeded: true,
                },
                CloseOutcome::NothingToClose => CommandReply {
                    text: messages::no_open_session().to_string(),
                    succeeded: false,
                },
            },
            Command::Remind => match self.session.remind().await {
                RemindOutcome::Reminded(count) => CommandReply {
                    text: messages::reminded(count),
                    succeeded: true,
                },
                RemindOutcome::NoOpenSession => CommandReply {
                    text: messages::no_open_session().to_string(),
                    succeeded: false,
                },
            },
        };
        Ok(reply)
    }

    /// Run an HTTP-triggered admin command for `actor_id`.
    ///
    /// An empty actor is a trusted internal caller; anyone else must be an
    /// admin. Platform failures are returned as errors.
    pub async fn admin_command(&self, command: Command, actor_id: &str) -> SlackResult<AdminReply> {
        if self.admins.authorize_command(actor_id) == Authorization::Denied {
            return Ok(AdminReply::Denied(messages::not_authorized().to_string()));
        }

        let mut reply = self.try_execute(command).await?;
        if reply.succeeded {
            reply.text.push_str(&self.admin_suffix);
        }
        Ok(AdminReply::Done(reply.text))
    }

    async fn reply(&self, channel: &str, thread: &str, text: &str) {
        if let Err(e) = self.client.post_message(channel, text, Some(thread)).await {
            warn!(channel, "Failed to reply to mention: {}", e);
        }
    }
}
