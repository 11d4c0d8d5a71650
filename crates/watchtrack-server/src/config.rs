//! HTTP listener settings.

use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "0.0.0.0:8788";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8788)),
        }
    }
}

impl ServerConfig {
    /// Build config from environment variables. An unparsable
    /// `WATCHTRACK_BIND` falls back to the default with a warning.
    pub fn from_env() -> Self {
        let bind = match std::env::var("WATCHTRACK_BIND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %value, "invalid WATCHTRACK_BIND ({e}), using {DEFAULT_BIND}");
                Self::default().bind
            }),
            Err(_) => Self::default().bind,
        };
        Self { bind }
    }
}
