//! Remote sync client contract.
//!
//! The queue and the playback forwarder only talk to the tracking service
//! through [`RemoteSyncClient`], so tests swap in a recording mock.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteSyncError;
use crate::model::{ActionKind, MediaItem, PlaybackStatus, ProviderIds, TrackedUser};

/// Minimum words the remote service accepts in a comment.
pub const MIN_COMMENT_WORDS: usize = 5;

/// Minimum words for a comment flagged as a review.
pub const MIN_REVIEW_WORDS: usize = 200;

// ─── Request / response types ───────────────────────────────────────────

/// A rating between 1 and 10. Zero removes an existing rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self, RemoteSyncError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 10)
            .map(Rating)
            .ok_or_else(|| {
                RemoteSyncError::InvalidRequest(format!(
                    "rating must be between 0 and 10, got {value}"
                ))
            })
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_unrate(self) -> bool {
        self.0 == 0
    }
}

/// A comment on a movie or episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRequest {
    pub comment: String,
    #[serde(default)]
    pub spoiler: bool,
    #[serde(default)]
    pub review: bool,
}

impl CommentRequest {
    /// Check the comment against the service's length rules.
    pub fn validate(&self) -> Result<(), RemoteSyncError> {
        let words = self.comment.split_whitespace().count();
        let required = if self.review {
            MIN_REVIEW_WORDS
        } else {
            MIN_COMMENT_WORDS
        };
        if words < required {
            let what = if self.review { "review" } else { "comment" };
            return Err(RemoteSyncError::InvalidRequest(format!(
                "{what} needs at least {required} words, got {words}"
            )));
        }
        Ok(())
    }
}

/// Filters for recommendation requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationFilter {
    #[serde(default)]
    pub ignore_collected: bool,
    #[serde(default)]
    pub ignore_watchlisted: bool,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// A recommended movie or show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub ids: ProviderIds,
}

// ─── Client trait ───────────────────────────────────────────────────────

#[async_trait]
pub trait RemoteSyncClient: Send + Sync + 'static {
    /// Push a library change for a group of same-kind items.
    ///
    /// The queue calls this once per movie batch and once per contiguous
    /// same-series episode run.
    async fn send_library_batch(
        &self,
        items: &[Arc<MediaItem>],
        user: &TrackedUser,
        action: ActionKind,
    ) -> Result<(), RemoteSyncError>;

    /// Report playback of a single movie or episode. `progress` is a
    /// percentage in `0.0..=100.0`.
    async fn send_status_update(
        &self,
        item: &MediaItem,
        status: PlaybackStatus,
        progress: f32,
        user: &TrackedUser,
    ) -> Result<(), RemoteSyncError>;

    async fn send_rating(
        &self,
        item: &MediaItem,
        rating: Rating,
        user: &TrackedUser,
    ) -> Result<(), RemoteSyncError>;

    async fn send_comment(
        &self,
        item: &MediaItem,
        comment: &CommentRequest,
        user: &TrackedUser,
    ) -> Result<(), RemoteSyncError>;

    async fn recommended_movies(
        &self,
        user: &TrackedUser,
        filter: &RecommendationFilter,
    ) -> Result<Vec<Recommendation>, RemoteSyncError>;

    async fn recommended_shows(
        &self,
        user: &TrackedUser,
        filter: &RecommendationFilter,
    ) -> Result<Vec<Recommendation>, RemoteSyncError>;
}
