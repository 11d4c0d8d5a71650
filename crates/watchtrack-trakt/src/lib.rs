//! Trakt API v2 implementation of [`watchtrack_core::RemoteSyncClient`].

pub mod client;
pub mod config;
pub mod payload;

pub use client::TraktClient;
pub use config::TraktConfig;
