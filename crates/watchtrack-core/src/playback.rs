//! Playback forwarding.
//!
//! Playback status is not batched: a start or a completed stop is pushed to
//! the remote service as soon as the host reports it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::UserConfigProvider;
use crate::error::RemoteSyncError;
use crate::model::{MediaItem, PlaybackStatus, TrackedUser};
use crate::remote::RemoteSyncClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEventKind {
    Start,
    Progress,
    Stop,
}

/// A playback notification from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    /// Local media server user that is playing.
    pub user_id: Uuid,
    pub item: MediaItem,
    /// Position in 100 ns ticks. Absent when the host lost track of it.
    #[serde(default)]
    pub position_ticks: Option<i64>,
    #[serde(default)]
    pub runtime_ticks: Option<i64>,
    /// Host marked the item as played.
    #[serde(default)]
    pub played: bool,
}

impl PlaybackEvent {
    /// Watched percentage, `0.0` when the runtime is unknown.
    pub fn progress(&self) -> f32 {
        match (self.position_ticks, self.runtime_ticks) {
            (Some(position), Some(runtime)) if runtime > 0 => {
                ((position as f64 / runtime as f64) * 100.0).clamp(0.0, 100.0) as f32
            }
            _ => 0.0,
        }
    }
}

/// Forwards playback lifecycle events to the remote service.
pub struct PlaybackForwarder {
    users: Arc<dyn UserConfigProvider>,
    remote: Arc<dyn RemoteSyncClient>,
}

impl PlaybackForwarder {
    pub fn new(users: Arc<dyn UserConfigProvider>, remote: Arc<dyn RemoteSyncClient>) -> Self {
        Self { users, remote }
    }

    /// Dispatch on the event kind. Returns whether a status update was sent.
    pub async fn handle(
        &self,
        kind: PlaybackEventKind,
        event: &PlaybackEvent,
    ) -> Result<bool, RemoteSyncError> {
        match kind {
            PlaybackEventKind::Start => self.on_playback_start(event).await,
            PlaybackEventKind::Progress => {
                self.on_playback_progress(event);
                Ok(false)
            }
            PlaybackEventKind::Stop => self.on_playback_stopped(event).await,
        }
    }

    pub async fn on_playback_start(&self, event: &PlaybackEvent) -> Result<bool, RemoteSyncError> {
        let Some(user) = self.resolve_user(event) else {
            return Ok(false);
        };
        self.send(&user, event, PlaybackStatus::Watching, event.progress())
            .await
    }

    pub fn on_playback_progress(&self, event: &PlaybackEvent) {
        trace!(item = %event.item.name, progress = event.progress(), "playback progress ignored");
    }

    pub async fn on_playback_stopped(
        &self,
        event: &PlaybackEvent,
    ) -> Result<bool, RemoteSyncError> {
        if event.position_ticks.is_none() {
            debug!(item = %event.item.name, "playback stopped without position, skipping");
            return Ok(false);
        }
        if !event.played {
            debug!(item = %event.item.name, "item not marked as played, skipping scrobble");
            return Ok(false);
        }
        let Some(user) = self.resolve_user(event) else {
            return Ok(false);
        };
        self.send(&user, event, PlaybackStatus::Scrobble, 100.0)
            .await
    }

    /// The tracked user for this event, if the item is one we report.
    pub fn resolve_user(&self, event: &PlaybackEvent) -> Option<Arc<TrackedUser>> {
        let Some(user) = self.users.find_user(event.user_id) else {
            trace!(user_id = %event.user_id, "playback by untracked user");
            return None;
        };
        if user.locations.is_empty() {
            debug!(account = %user.account, "tracked user has no monitored locations");
            return None;
        }
        if !event.item.is_trackable() {
            trace!(item = %event.item.name, "playback of untracked media kind");
            return None;
        }
        if !user.monitors(&event.item.path) {
            debug!(
                account = %user.account,
                path = %event.item.path.display(),
                "playback outside monitored locations"
            );
            return None;
        }
        Some(user)
    }

    async fn send(
        &self,
        user: &TrackedUser,
        event: &PlaybackEvent,
        status: PlaybackStatus,
        progress: f32,
    ) -> Result<bool, RemoteSyncError> {
        self.remote
            .send_status_update(&event.item, status, progress, user)
            .await?;
        info!(
            account = %user.account,
            item = %event.item.name,
            status = ?status,
            progress,
            "playback status sent"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticUserConfig;
    use crate::model::{ActionKind, MediaKind, ProviderIds};
    use crate::remote::{CommentRequest, Rating, Recommendation, RecommendationFilter};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRemote {
        statuses: Mutex<Vec<(String, PlaybackStatus, f32)>>,
        fail: bool,
    }

    #[async_trait]
    impl RemoteSyncClient for RecordingRemote {
        async fn send_library_batch(
            &self,
            _items: &[Arc<MediaItem>],
            _user: &TrackedUser,
            _action: ActionKind,
        ) -> Result<(), RemoteSyncError> {
            Ok(())
        }

        async fn send_status_update(
            &self,
            item: &MediaItem,
            status: PlaybackStatus,
            progress: f32,
            _user: &TrackedUser,
        ) -> Result<(), RemoteSyncError> {
            if self.fail {
                return Err(RemoteSyncError::Transport("connection refused".into()));
            }
            self.statuses
                .lock()
                .unwrap()
                .push((item.name.clone(), status, progress));
            Ok(())
        }

        async fn send_rating(
            &self,
            _item: &MediaItem,
            _rating: Rating,
            _user: &TrackedUser,
        ) -> Result<(), RemoteSyncError> {
            Ok(())
        }

        async fn send_comment(
            &self,
            _item: &MediaItem,
            _comment: &CommentRequest,
            _user: &TrackedUser,
        ) -> Result<(), RemoteSyncError> {
            Ok(())
        }

        async fn recommended_movies(
            &self,
            _user: &TrackedUser,
            _filter: &RecommendationFilter,
        ) -> Result<Vec<Recommendation>, RemoteSyncError> {
            Ok(Vec::new())
        }

        async fn recommended_shows(
            &self,
            _user: &TrackedUser,
            _filter: &RecommendationFilter,
        ) -> Result<Vec<Recommendation>, RemoteSyncError> {
            Ok(Vec::new())
        }
    }

    fn setup(locations: &[&str], remote: RecordingRemote) -> (PlaybackForwarder, Arc<RecordingRemote>, Uuid) {
        let user = TrackedUser {
            linked_user_id: Uuid::new_v4(),
            account: "alice".into(),
            access_token: "token".into(),
            locations: locations.iter().map(PathBuf::from).collect(),
        };
        let user_id = user.linked_user_id;
        let remote = Arc::new(remote);
        let forwarder =
            PlaybackForwarder::new(Arc::new(StaticUserConfig::new(vec![user])), remote.clone());
        (forwarder, remote, user_id)
    }

    fn event(user_id: Uuid, path: &str, kind: MediaKind) -> PlaybackEvent {
        PlaybackEvent {
            user_id,
            item: MediaItem {
                id: Uuid::new_v4(),
                name: "Alpha".into(),
                path: PathBuf::from(path),
                year: Some(2001),
                ids: ProviderIds::default(),
                kind,
            },
            position_ticks: Some(2_500),
            runtime_ticks: Some(10_000),
            played: true,
        }
    }

    #[test]
    fn test_progress() {
        let mut e = event(Uuid::new_v4(), "/media/movies/Alpha", MediaKind::Movie);
        assert_eq!(e.progress(), 25.0);

        e.runtime_ticks = None;
        assert_eq!(e.progress(), 0.0);

        e.runtime_ticks = Some(1_000);
        assert_eq!(e.progress(), 100.0);
    }

    #[tokio::test]
    async fn test_start_sends_watching() {
        let (forwarder, remote, user_id) = setup(&["/media/movies"], RecordingRemote::default());
        let e = event(user_id, "/media/movies/Alpha/alpha.mkv", MediaKind::Movie);

        assert!(forwarder.on_playback_start(&e).await.unwrap());

        let statuses = remote.statuses.lock().unwrap().clone();
        assert_eq!(statuses, vec![("Alpha".to_string(), PlaybackStatus::Watching, 25.0)]);
    }

    #[tokio::test]
    async fn test_start_sends_once_for_overlapping_locations() {
        let (forwarder, remote, user_id) =
            setup(&["/media", "/media/movies"], RecordingRemote::default());
        let e = event(user_id, "/media/movies/Alpha", MediaKind::Movie);

        forwarder.on_playback_start(&e).await.unwrap();

        assert_eq!(remote.statuses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_start_skips_untracked_user() {
        let (forwarder, remote, _) = setup(&["/media/movies"], RecordingRemote::default());
        let e = event(Uuid::new_v4(), "/media/movies/Alpha", MediaKind::Movie);

        assert!(!forwarder.on_playback_start(&e).await.unwrap());
        assert!(remote.statuses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_skips_user_without_locations() {
        let (forwarder, remote, user_id) = setup(&[], RecordingRemote::default());
        let e = event(user_id, "/media/movies/Alpha", MediaKind::Movie);

        assert!(!forwarder.on_playback_start(&e).await.unwrap());
        assert!(remote.statuses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_skips_outside_locations_and_other_kinds() {
        let (forwarder, remote, user_id) = setup(&["/media/movies"], RecordingRemote::default());

        let outside = event(user_id, "/downloads/Alpha", MediaKind::Movie);
        assert!(!forwarder.on_playback_start(&outside).await.unwrap());

        let other = event(user_id, "/media/movies/trailer.mkv", MediaKind::Other);
        assert!(!forwarder.on_playback_start(&other).await.unwrap());

        assert!(remote.statuses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_scrobbles_played_item() {
        let (forwarder, remote, user_id) = setup(&["/media/movies"], RecordingRemote::default());
        let e = event(user_id, "/media/movies/Alpha", MediaKind::Movie);

        assert!(forwarder
            .handle(PlaybackEventKind::Stop, &e)
            .await
            .unwrap());

        let statuses = remote.statuses.lock().unwrap().clone();
        assert_eq!(statuses, vec![("Alpha".to_string(), PlaybackStatus::Scrobble, 100.0)]);
    }

    #[tokio::test]
    async fn test_stop_requires_position_and_played() {
        let (forwarder, remote, user_id) = setup(&["/media/movies"], RecordingRemote::default());

        let mut no_position = event(user_id, "/media/movies/Alpha", MediaKind::Movie);
        no_position.position_ticks = None;
        assert!(!forwarder.on_playback_stopped(&no_position).await.unwrap());

        let mut unplayed = event(user_id, "/media/movies/Alpha", MediaKind::Movie);
        unplayed.played = false;
        assert!(!forwarder.on_playback_stopped(&unplayed).await.unwrap());

        assert!(remote.statuses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_is_ignored() {
        let (forwarder, remote, user_id) = setup(&["/media/movies"], RecordingRemote::default());
        let e = event(user_id, "/media/movies/Alpha", MediaKind::Movie);

        assert!(!forwarder
            .handle(PlaybackEventKind::Progress, &e)
            .await
            .unwrap());
        assert!(remote.statuses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_error_propagates() {
        let remote = RecordingRemote {
            fail: true,
            ..Default::default()
        };
        let (forwarder, _, user_id) = setup(&["/media/movies"], remote);
        let e = event(user_id, "/media/movies/Alpha", MediaKind::Movie);

        let err = forwarder.on_playback_start(&e).await.unwrap_err();
        assert!(matches!(err, RemoteSyncError::Transport(_)));
    }

    #[test]
    fn test_event_kind_deserialization() {
        let kind: PlaybackEventKind = serde_json::from_str("\"stop\"").unwrap();
        assert_eq!(kind, PlaybackEventKind::Stop);
    }
}
