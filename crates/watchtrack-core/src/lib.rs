//! watchtrack core
//!
//! Mirrors a media server's library and playback activity to a social
//! tracking service. Library changes are matched against each tracked user's
//! monitored folders, debounced, partitioned by user, media kind and action,
//! and flushed as grouped remote calls. Playback status is forwarded
//! immediately.

pub mod batch;
pub mod config;
pub mod error;
pub mod model;
pub mod playback;
pub mod queue;
pub mod remote;

pub use batch::{BatchKind, FlushPlan, QueueEntry, SyncBatch};
pub use config::{FileUserConfig, StaticUserConfig, SyncConfig, UserConfigProvider, UsersFile};
pub use error::{ConfigError, QueueError, RemoteSyncError};
pub use model::{
    ActionKind, EpisodeInfo, MediaItem, MediaKind, PlaybackStatus, ProviderIds, TrackedUser,
};
pub use playback::{PlaybackEvent, PlaybackEventKind, PlaybackForwarder};
pub use queue::{FlushReport, LibrarySyncQueue, QueueState};
pub use remote::{
    CommentRequest, Rating, Recommendation, RecommendationFilter, RemoteSyncClient,
};
