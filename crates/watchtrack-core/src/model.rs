//! Media items, tracked users and the small enums that tag queue entries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Actions & statuses ─────────────────────────────────────────────────

/// What happened to a library item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Remove,
    Update,
}

/// Playback status pushed to the remote service outside of batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Playback started.
    Watching,
    /// Playback finished and the host marked the item as played.
    Scrobble,
}

// ─── Media ──────────────────────────────────────────────────────────────

/// External database identifiers the remote service matches media on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trakt: Option<u64>,
}

impl ProviderIds {
    pub fn is_empty(&self) -> bool {
        self.imdb.is_none() && self.tmdb.is_none() && self.tvdb.is_none() && self.trakt.is_none()
    }
}

/// Series metadata carried by episodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    /// Host-side id of the owning series. Episode batches are chunked on it.
    pub series_id: Uuid,
    pub series_name: String,
    #[serde(default)]
    pub series_year: Option<i32>,
    #[serde(default)]
    pub series_ids: ProviderIds,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub number: Option<u32>,
}

/// Classification of a library item, resolved once from host metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Episode(EpisodeInfo),
    Other,
}

/// A library item as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub ids: ProviderIds,
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn is_movie(&self) -> bool {
        matches!(self.kind, MediaKind::Movie)
    }

    pub fn episode(&self) -> Option<&EpisodeInfo> {
        match &self.kind {
            MediaKind::Episode(info) => Some(info),
            _ => None,
        }
    }

    /// Movies and episodes are the only kinds the remote service tracks.
    pub fn is_trackable(&self) -> bool {
        !matches!(self.kind, MediaKind::Other)
    }
}

// ─── Tracked users ──────────────────────────────────────────────────────

/// A local profile linked to a remote account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedUser {
    /// Id of the local media server user.
    pub linked_user_id: Uuid,
    /// Remote account name, used in logs and error messages.
    pub account: String,
    /// Bearer token for the remote API. Obtaining it is out of scope.
    #[serde(default, skip_serializing)]
    pub access_token: String,
    /// Monitored folders, in configuration order.
    #[serde(default)]
    pub locations: Vec<PathBuf>,
}

impl std::fmt::Debug for TrackedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedUser")
            .field("linked_user_id", &self.linked_user_id)
            .field("account", &self.account)
            .field("access_token", &"<redacted>")
            .field("locations", &self.locations)
            .finish()
    }
}

impl TrackedUser {
    /// Monitored locations that contain `path`, in configuration order.
    pub fn matching_locations<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a PathBuf> {
        self.locations
            .iter()
            .filter(move |location| is_within(path, location))
    }

    pub fn monitors(&self, path: &Path) -> bool {
        self.matching_locations(path).next().is_some()
    }

    /// Users are identified by their linked local id, not by account name.
    pub fn same_user(&self, other: &TrackedUser) -> bool {
        self.linked_user_id == other.linked_user_id
    }
}

/// Whether `path` lies strictly below `location`.
///
/// Comparison is per path component, so `/media/movies2/x` is not inside
/// `/media/movies`, and a trailing separator on either side is ignored.
pub fn is_within(path: &Path, location: &Path) -> bool {
    if location.as_os_str().is_empty() {
        return false;
    }
    path != location && path.starts_with(location)
}
