//! Inbound Slack Events API payloads.
//!
//! Payloads are decoded in two steps: the outer `type` discriminant first,
//! then only the shape that discriminant calls for. Handled kinds:
//! - `url_verification` - the setup handshake, answered with the challenge
//! - `event_callback` wrapping `message` or `app_mention`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{SlackError, SlackResult};

/// A decoded inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    /// Endpoint verification handshake.
    UrlVerification {
        /// Token to echo back verbatim.
        challenge: String,
    },
    /// An event delivered through the Events API.
    EventCallback(SlackEvent),
    /// Outer payload type we do not handle.
    Unknown(String),
}

/// Slack event types that we handle.
#[derive(Debug, Clone, PartialEq)]
pub enum SlackEvent {
    /// App mention event (@bot in a channel).
    AppMention(AppMentionEvent),
    /// Message event (DMs to the bot among them).
    Message(MessageEvent),
    /// Unknown event type, kept for logging.
    Unknown(String),
}

#[derive(Deserialize)]
struct Discriminant {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct VerificationPayload {
    challenge: String,
}

/// Event callback envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    /// Team ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// API app ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_app_id: Option<String>,
    /// The actual event, decoded lazily by [`parse_event`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
    /// Event ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Event time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<u64>,
}

/// Event payload for app mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMentionEvent {
    /// User who mentioned the bot.
    pub user: String,
    /// Text of the message (including the mention).
    #[serde(default)]
    pub text: String,
    /// Channel where the mention occurred.
    pub channel: String,
    /// Timestamp of the message.
    pub ts: String,
    /// Thread timestamp (if in a thread).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

/// Event payload for messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// User who sent the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Text of the message.
    #[serde(default)]
    pub text: String,
    /// Channel where the message was sent.
    pub channel: String,
    /// Channel type (im, channel, group, mpim).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    /// Timestamp of the message.
    pub ts: String,
    /// Thread timestamp (if in a thread).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Subtype of message (e.g., "bot_message", "message_changed").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Bot ID (if message is from a bot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl MessageEvent {
    /// Check if this is a direct message.
    pub fn is_direct_message(&self) -> bool {
        self.channel_type.as_deref() == Some("im")
            || (self.channel_type.is_none() && self.channel.starts_with('D'))
    }

    /// Check if this is a bot message.
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }

    /// Edits, deletions, joins and the like carry a subtype; plain user
    /// messages do not.
    pub fn is_plain_user_message(&self) -> bool {
        self.subtype.is_none() && !self.is_bot_message() && self.user.is_some()
    }
}

/// Decode a raw request body into an [`InboundPayload`].
pub fn parse_payload(body: &str) -> SlackResult<InboundPayload> {
    let json: Value = serde_json::from_str(body)?;
    let Discriminant { kind } = serde_json::from_value(json.clone())
        .map_err(|_| SlackError::InvalidPayload("Missing type field".to_string()))?;

    debug!("Parsing payload type: {}", kind);

    match kind.as_str() {
        "url_verification" => {
            let VerificationPayload { challenge } = serde_json::from_value(json)
                .map_err(|e| SlackError::InvalidPayload(format!("Bad verification: {}", e)))?;
            Ok(InboundPayload::UrlVerification { challenge })
        }
        "event_callback" => {
            let payload: EventPayload = serde_json::from_value(json)?;
            Ok(InboundPayload::EventCallback(parse_event(&payload)?))
        }
        other => Ok(InboundPayload::Unknown(other.to_string())),
    }
}

/// Parse the inner event of an event callback.
pub fn parse_event(payload: &EventPayload) -> SlackResult<SlackEvent> {
    let event_json = payload
        .event
        .as_ref()
        .ok_or_else(|| SlackError::InvalidPayload("Missing event field".to_string()))?;

    let event_type = event_json
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("unknown");

    debug!("Parsing event type: {}", event_type);

    match event_type {
        "app_mention" => {
            let event: AppMentionEvent = serde_json::from_value(event_json.clone())?;
            Ok(SlackEvent::AppMention(event))
        }
        "message" => {
            let event: MessageEvent = serde_json::from_value(event_json.clone())?;
            Ok(SlackEvent::Message(event))
        }
        other => {
            warn!("Unknown event type: {}", other);
            Ok(SlackEvent::Unknown(other.to_string()))
        }
    }
}

/// Remove `<@U...>` mention tokens from message text.
///
/// # Example
///
/// ```rust
/// use standup_slack::events::strip_mentions;
///
/// assert_eq!(strip_mentions("<@U12345> close checkin"), "close checkin");
/// ```
pub fn strip_mentions(text: &str) -> String {
    let mut result = text.to_string();

    while let Some(start) = result.find("<@") {
        if let Some(end) = result[start..].find('>') {
            result = format!("{}{}", &result[..start], &result[start + end + 1..]);
        } else {
            break;
        }
    }

    result.trim().to_string()
}
