//! Error types shared across the sync pipeline.

use thiserror::Error;

/// Errors raised synchronously by the library sync queue.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("library sync queue is closed")]
    Closed,
}

/// Errors surfaced by a [`RemoteSyncClient`](crate::remote::RemoteSyncClient).
///
/// The queue logs these and moves on; it never retries or rewrites them.
#[derive(Error, Debug)]
pub enum RemoteSyncError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote service rejected credentials for {0}")]
    Unauthorized(String),

    #[error("remote service returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("remote call cancelled")]
    Cancelled,
}

/// Errors loading tracked-user configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
