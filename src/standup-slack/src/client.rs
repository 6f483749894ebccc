//! Slack Web API access.
//!
//! The session and dispatcher only see the [`PlatformClient`] trait; the
//! [`SlackApiClient`] implementation talks to `https://slack.com/api` with a
//! bearer token. Every call checks the `ok` field of the JSON envelope and
//! turns `ok: false` into a [`SlackApiError`].

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::error::{SlackApiError, SlackError, SlackResult};

/// Page size requested from cursor-paginated methods.
const PAGE_LIMIT: &str = "200";

/// A channel as returned by `conversations.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel ID (C...).
    pub id: String,
    /// Channel display name, without the leading `#`.
    #[serde(default)]
    pub name: String,
    /// Whether the bot is a member of the channel.
    #[serde(default)]
    pub is_member: bool,
}

/// The calls the check-in core makes against the chat platform.
#[async_trait::async_trait]
pub trait PlatformClient: Send + Sync {
    /// List every channel visible to the bot.
    async fn list_channels(&self) -> SlackResult<Vec<ChannelInfo>>;

    /// List the member IDs of a channel, in platform order.
    async fn list_members(&self, channel_id: &str) -> SlackResult<Vec<String>>;

    /// Open (or reuse) a direct-message channel with a member.
    async fn open_direct_message(&self, member_id: &str) -> SlackResult<String>;

    /// Post a message, optionally as a thread reply. Returns the message `ts`.
    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> SlackResult<String>;

    /// Resolve a member's display name.
    async fn display_name(&self, member_id: &str) -> SlackResult<String>;

    /// Call `api.test`, optionally asking Slack to echo back an error.
    async fn test_api(&self, error: Option<&str>) -> SlackResult<()>;

    /// Open a DM with a member and post `text` into it.
    async fn send_direct_message(&self, member_id: &str, text: &str) -> SlackResult<String> {
        let channel = self.open_direct_message(member_id).await?;
        self.post_message(&channel, text, None).await
    }
}

/// [`PlatformClient`] backed by the Slack Web API.
#[derive(Clone)]
pub struct SlackApiClient {
    client: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl std::fmt::Debug for SlackApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackApiClient")
            .field("token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SlackApiClient {
    /// Create a client from the bot configuration.
    pub fn new(config: &BotConfig) -> SlackResult<Self> {
        config.validate()?;
        Self::with_base_url(config.bot_token(), config.api_url())
    }

    /// Create a client against an explicit API base URL.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> SlackResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SlackError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token: SecretString::new(token.into().into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn api_get(&self, method: &str, query: &[(&str, &str)]) -> SlackResult<Value> {
        debug!(method, "Slack GET");
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, method))
            .bearer_auth(self.token.expose_secret())
            .query(query)
            .send()
            .await?;
        read_envelope(method, response).await
    }

    async fn api_post(&self, method: &str, payload: &Value) -> SlackResult<Value> {
        debug!(method, "Slack POST");
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .bearer_auth(self.token.expose_secret())
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await?;
        read_envelope(method, response).await
    }
}

async fn read_envelope(method: &str, response: reqwest::Response) -> SlackResult<Value> {
    if response.status() == 429 {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        return Err(SlackError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SlackError::Api(format!("{} returned {}: {}", method, status, body)));
    }

    let json: Value = response.json().await?;
    if json.get("ok").and_then(Value::as_bool) != Some(true) {
        let code = json
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        warn!(method, error = code, "Slack rejected request");
        return Err(SlackApiError::new(code, method).into());
    }

    Ok(json)
}

fn next_cursor(json: &Value) -> Option<String> {
    json.pointer("/response_metadata/next_cursor")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn pick_display_name(user: &Value) -> Option<String> {
    [
        "/profile/display_name",
        "/profile/real_name",
        "/real_name",
        "/name",
    ]
    .iter()
    .filter_map(|p| user.pointer(p).and_then(Value::as_str))
    .find(|s| !s.is_empty())
    .map(str::to_string)
}

#[async_trait::async_trait]
impl PlatformClient for SlackApiClient {
    async fn list_channels(&self) -> SlackResult<Vec<ChannelInfo>> {
        let mut channels = Vec::new();
        let mut cursor = String::new();

        loop {
            let json = self
                .api_get(
                    "conversations.list",
                    &[
                        ("types", "public_channel,private_channel"),
                        ("exclude_archived", "true"),
                        ("limit", PAGE_LIMIT),
                        ("cursor", cursor.as_str()),
                    ],
                )
                .await?;

            let page: Vec<ChannelInfo> = match json.get("channels") {
                Some(v) => serde_json::from_value(v.clone())?,
                None => Vec::new(),
            };
            channels.extend(page);

            match next_cursor(&json) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        debug!(count = channels.len(), "Listed channels");
        Ok(channels)
    }

    async fn list_members(&self, channel_id: &str) -> SlackResult<Vec<String>> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        loop {
            let json = self
                .api_get(
                    "conversations.members",
                    &[
                        ("channel", channel_id),
                        ("limit", PAGE_LIMIT),
                        ("cursor", cursor.as_str()),
                    ],
                )
                .await?;

            let page: Vec<String> = match json.get("members") {
                Some(v) => serde_json::from_value(v.clone())?,
                None => Vec::new(),
            };
            members.extend(page);

            match next_cursor(&json) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        Ok(members)
    }

    async fn open_direct_message(&self, member_id: &str) -> SlackResult<String> {
        let json = self
            .api_post("conversations.open", &serde_json::json!({ "users": member_id }))
            .await?;

        json.pointer("/channel/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SlackError::InvalidPayload("Missing channel.id in response".to_string()))
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> SlackResult<String> {
        let mut payload = serde_json::json!({
            "channel": channel_id,
            "text": text,
        });
        if let Some(ts) = thread_ts {
            payload["thread_ts"] = serde_json::json!(ts);
        }

        let json = self.api_post("chat.postMessage", &payload).await?;

        json.get("ts")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SlackError::InvalidPayload("Missing ts in response".to_string()))
    }

    async fn display_name(&self, member_id: &str) -> SlackResult<String> {
        let json = self.api_get("users.info", &[("user", member_id)]).await?;

        json.get("user")
            .and_then(pick_display_name)
            .ok_or_else(|| SlackError::User(format!("No name for user {}", member_id)))
    }

    async fn test_api(&self, error: Option<&str>) -> SlackResult<()> {
        let payload = match error {
            Some(e) => serde_json::json!({ "error": e }),
            None => serde_json::json!({}),
        };
        self.api_post("api.test", &payload).await.map(|_| ())
    }
}
