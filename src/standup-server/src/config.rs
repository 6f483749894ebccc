//! Server configuration.

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB, event callbacks are small
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_body_size: default_max_body_size(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from environment variables.
    ///
    /// `STANDUP_LISTEN_ADDR` wins over `PORT`, which binds every interface.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("STANDUP_LISTEN_ADDR") {
            config.listen_addr = addr;
        } else if let Ok(port) = std::env::var("PORT") {
            let port: u16 = parse_number("PORT", &port)?;
            config.listen_addr = format!("0.0.0.0:{}", port);
        }

        if let Ok(timeout) = std::env::var("STANDUP_SHUTDOWN_TIMEOUT") {
            config.shutdown_timeout = parse_number("STANDUP_SHUTDOWN_TIMEOUT", &timeout)?;
        }

        Ok(config)
    }
}

fn parse_number<T>(name: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", name, raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.shutdown_timeout, 30);
    }

    #[test]
    fn test_numeric_env_values_are_checked() {
        assert_eq!(parse_number::<u16>("PORT", " 8080 ").unwrap(), 8080);
        assert_eq!(
            parse_number::<u64>("STANDUP_SHUTDOWN_TIMEOUT", "5").unwrap(),
            5
        );

        let err = parse_number::<u64>("STANDUP_SHUTDOWN_TIMEOUT", "soon").unwrap_err();
        assert!(err.to_string().contains("Invalid STANDUP_SHUTDOWN_TIMEOUT 'soon'"));
        assert!(parse_number::<u64>("STANDUP_SHUTDOWN_TIMEOUT", "-1").is_err());
        assert!(parse_number::<u16>("PORT", "70000").is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"listen_addr": "127.0.0.1:8080"}"#).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.shutdown_timeout, 30);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }
}
