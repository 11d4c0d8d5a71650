//! Trakt client settings.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.trakt.tv";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct TraktConfig {
    /// API base URL, without trailing slash.
    pub api_url: String,
    /// Application client id, sent as `trakt-api-key`.
    pub client_id: String,
    pub http_timeout: Duration,
}

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            client_id: String::new(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl TraktConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("TRAKT_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            client_id: std::env::var("TRAKT_CLIENT_ID").unwrap_or_default(),
            http_timeout: Duration::from_secs(
                std::env::var("TRAKT_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        }
    }
}
