// Shared test utilities for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use watchtrack_core::{
    ActionKind, CommentRequest, MediaItem, MediaKind, PlaybackStatus, ProviderIds, Rating,
    Recommendation, RecommendationFilter, RemoteSyncClient, RemoteSyncError, StaticUserConfig,
    SyncConfig, TrackedUser,
};
use watchtrack_server::AppState;

/// Every call the server made to the remote service.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Batch {
        account: String,
        action: ActionKind,
        items: Vec<String>,
    },
    Status {
        item: String,
        status: PlaybackStatus,
    },
    Rating {
        item: String,
        rating: u8,
    },
    Comment {
        item: String,
        spoiler: bool,
    },
    Recommendations {
        kind: &'static str,
        limit: Option<u32>,
    },
}

#[derive(Default)]
pub struct MockRemote {
    calls: Mutex<Vec<RemoteCall>>,
    pub fail: bool,
}

impl MockRemote {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RemoteCall) -> Result<(), RemoteSyncError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(RemoteSyncError::Rejected {
                status: 500,
                body: "upstream down".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSyncClient for MockRemote {
    async fn send_library_batch(
        &self,
        items: &[Arc<MediaItem>],
        user: &TrackedUser,
        action: ActionKind,
    ) -> Result<(), RemoteSyncError> {
        self.record(RemoteCall::Batch {
            account: user.account.clone(),
            action,
            items: items.iter().map(|i| i.name.clone()).collect(),
        })
    }

    async fn send_status_update(
        &self,
        item: &MediaItem,
        status: PlaybackStatus,
        _progress: f32,
        _user: &TrackedUser,
    ) -> Result<(), RemoteSyncError> {
        self.record(RemoteCall::Status {
            item: item.name.clone(),
            status,
        })
    }

    async fn send_rating(
        &self,
        item: &MediaItem,
        rating: Rating,
        _user: &TrackedUser,
    ) -> Result<(), RemoteSyncError> {
        self.record(RemoteCall::Rating {
            item: item.name.clone(),
            rating: rating.value(),
        })
    }

    async fn send_comment(
        &self,
        item: &MediaItem,
        comment: &CommentRequest,
        _user: &TrackedUser,
    ) -> Result<(), RemoteSyncError> {
        self.record(RemoteCall::Comment {
            item: item.name.clone(),
            spoiler: comment.spoiler,
        })
    }

    async fn recommended_movies(
        &self,
        _user: &TrackedUser,
        filter: &RecommendationFilter,
    ) -> Result<Vec<Recommendation>, RemoteSyncError> {
        self.record(RemoteCall::Recommendations {
            kind: "movies",
            limit: filter.limit,
        })?;
        Ok(vec![Recommendation {
            title: "Alpha".into(),
            year: Some(2001),
            ids: ProviderIds::default(),
        }])
    }

    async fn recommended_shows(
        &self,
        _user: &TrackedUser,
        filter: &RecommendationFilter,
    ) -> Result<Vec<Recommendation>, RemoteSyncError> {
        self.record(RemoteCall::Recommendations {
            kind: "shows",
            limit: filter.limit,
        })?;
        Ok(Vec::new())
    }
}

pub fn tracked_user(account: &str, locations: &[&str]) -> TrackedUser {
    TrackedUser {
        linked_user_id: Uuid::new_v4(),
        account: account.into(),
        access_token: format!("{account}-token"),
        locations: locations.iter().map(PathBuf::from).collect(),
    }
}

pub fn movie(path: &str) -> MediaItem {
    MediaItem {
        id: Uuid::new_v4(),
        name: path.rsplit('/').next().unwrap_or(path).into(),
        path: PathBuf::from(path),
        year: Some(2001),
        ids: ProviderIds::default(),
        kind: MediaKind::Movie,
    }
}

/// Create a test AppState. The debounce is long enough that only an
/// explicit flush sends library batches.
pub fn test_app_state(users: Vec<TrackedUser>, remote: Arc<MockRemote>) -> Arc<AppState> {
    let config = SyncConfig {
        debounce: Duration::from_secs(3600),
        ..Default::default()
    };
    Arc::new(AppState::new(
        &config,
        Arc::new(StaticUserConfig::new(users)),
        remote,
    ))
}
