//! Client configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::RateLimitReason;

/// Full client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ClientConfig {
    /// Rate-limit status endpoint and monitor settings
    #[validate(nested)]
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Cross-tab sync settings
    #[validate(nested)]
    #[serde(default)]
    pub sync: SyncConfig,
    /// Default log filter (overridden by `RUST_LOG`)
    #[validate(length(min = 1))]
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            sync: SyncConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Where and how the rate-limit status is fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RateLimitConfig {
    /// Application origin, e.g. `https://chat.example.com`
    #[validate(length(min = 1))]
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the status endpoint
    #[validate(length(min = 1))]
    #[serde(default = "default_status_path")]
    pub status_path: String,
    /// Per-request timeout
    #[validate(range(min = 1_u64, max = 120_u64))]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reasons the chat input monitor reacts to
    #[serde(default = "default_watched_reasons")]
    pub watched_reasons: Vec<RateLimitReason>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            status_path: default_status_path(),
            timeout_secs: default_timeout_secs(),
            watched_reasons: default_watched_reasons(),
        }
    }
}

/// Cross-tab channel settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct SyncConfig {
    /// Channel name; must be unique per purpose within the origin
    #[validate(length(min = 1))]
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    /// Disable to make the bus inert
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { channel_name: default_channel_name(), enabled: true }
    }
}

// Default value functions
pub const fn default_true() -> bool {
    true
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

pub fn default_status_path() -> String {
    "/api/rate-limit".to_string()
}

pub const fn default_timeout_secs() -> u64 {
    10
}

pub fn default_watched_reasons() -> Vec<RateLimitReason> {
    vec![RateLimitReason::Messages, RateLimitReason::Tokens]
}

pub fn default_channel_name() -> String {
    "clonegpt-session".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.channel_name, "clonegpt-session");
        assert!(config.sync.enabled);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "rate_limit": { "timeout_secs": 30 } }"#).unwrap();
        assert_eq!(config.rate_limit.timeout_secs, 30);
        assert_eq!(config.rate_limit.status_path, "/api/rate-limit");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_rejects_out_of_range_timeout_and_empty_channel() {
        let mut config = ClientConfig::default();
        config.rate_limit.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.sync.channel_name.clear();
        assert!(config.validate().is_err());
    }
}
