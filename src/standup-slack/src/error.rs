//! Error types for the check-in bot.
//!
//! Transport failures (the HTTP call to Slack never completed) and platform
//! rejections (Slack answered with `ok: false`) are both represented here.
//! Callers treat them the same way: log, abort the operation, never retry.

use thiserror::Error;

/// Errors that can occur while talking to Slack or loading configuration.
#[derive(Error, Debug)]
pub enum SlackError {
    /// Configuration error (missing or invalid config).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error (invalid token, revoked, etc.).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// API request failed.
    #[error("Slack API error: {0}")]
    Api(String),

    /// API rate limited.
    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds Slack asked us to wait.
        retry_after_secs: u64,
    },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Channel not found, or the bot is not in it.
    #[error("Channel error: {0}")]
    Channel(String),

    /// User not found.
    #[error("User error: {0}")]
    User(String),

    /// Invalid payload received from Slack.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SlackError {
    /// True when the request never got a usable answer from Slack.
    pub fn is_transport(&self) -> bool {
        matches!(self, SlackError::Network(_) | SlackError::Timeout(_))
    }
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlackError::Timeout(err.to_string())
        } else if err.is_connect() {
            SlackError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            SlackError::Json(err.to_string())
        } else {
            SlackError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::Json(err.to_string())
    }
}

/// Result type for Slack operations.
pub type SlackResult<T> = std::result::Result<T, SlackError>;

/// A non-success envelope returned by the Slack Web API.
#[derive(Debug, Clone)]
pub struct SlackApiError {
    /// Error code from Slack (e.g., "channel_not_found").
    pub code: String,
    /// Method that produced the error.
    pub message: String,
    /// Whether Slack considers this error transient.
    pub retryable: bool,
}

impl SlackApiError {
    /// Create a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let retryable = Self::is_retryable_code(&code);
        Self {
            code,
            message: message.into(),
            retryable,
        }
    }

    fn is_retryable_code(code: &str) -> bool {
        matches!(
            code,
            "ratelimited"
                | "rate_limited"
                | "service_unavailable"
                | "internal_error"
                | "request_timeout"
                | "fatal_error"
        )
    }
}

impl From<SlackApiError> for SlackError {
    fn from(err: SlackApiError) -> Self {
        match err.code.as_str() {
            "ratelimited" | "rate_limited" => SlackError::RateLimited {
                retry_after_secs: 30,
            },
            "invalid_auth" | "not_authed" | "account_inactive" | "token_revoked" => {
                SlackError::Auth(format!("{}: {}", err.message, err.code))
            }
            "channel_not_found" | "not_in_channel" | "is_archived" => {
                SlackError::Channel(format!("{}: {}", err.message, err.code))
            }
            "user_not_found" | "user_not_visible" => {
                SlackError::User(format!("{}: {}", err.message, err.code))
            }
            _ => SlackError::Api(format!("{}: {}", err.message, err.code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SlackError::Config("SLACK_BOT_TOKEN not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: SLACK_BOT_TOKEN not set"
        );

        let err = SlackError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(err.to_string(), "Rate limited: retry after 60 seconds");
    }

    #[test]
    fn test_api_error_retryable() {
        assert!(SlackApiError::new("ratelimited", "chat.postMessage").retryable);
        assert!(!SlackApiError::new("channel_not_found", "conversations.members").retryable);
    }

    #[test]
    fn test_api_error_conversion() {
        let err: SlackError = SlackApiError::new("invalid_auth", "auth.test").into();
        assert!(matches!(err, SlackError::Auth(_)));

        let err: SlackError = SlackApiError::new("channel_not_found", "conversations.members").into();
        assert!(matches!(err, SlackError::Channel(_)));
        assert!(err.to_string().contains("conversations.members"));

        let err: SlackError = SlackApiError::new("user_not_found", "users.info").into();
        assert!(matches!(err, SlackError::User(_)));

        let err: SlackError = SlackApiError::new("msg_too_long", "chat.postMessage").into();
        assert!(matches!(err, SlackError::Api(_)));
    }

    #[test]
    fn test_transport_classification() {
        assert!(SlackError::Network("reset".to_string()).is_transport());
        assert!(SlackError::Timeout("30s".to_string()).is_transport());
        assert!(!SlackError::Channel("channel_not_found".to_string()).is_transport());
    }
}
