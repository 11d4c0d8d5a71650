use std::sync::Arc;

use watchtrack_core::{
    LibrarySyncQueue, PlaybackForwarder, RemoteSyncClient, SyncConfig, UserConfigProvider,
};

use crate::catalog::ItemCatalog;

/// Shared application state, passed to handlers as `State<Arc<AppState>>`.
pub struct AppState {
    pub queue: LibrarySyncQueue,
    pub playback: PlaybackForwarder,
    pub remote: Arc<dyn RemoteSyncClient>,
    pub users: Arc<dyn UserConfigProvider>,
    pub catalog: ItemCatalog,
}

impl AppState {
    /// Wire the queue and forwarder to the same user provider and client.
    /// Spawns the queue worker, so it must run inside a Tokio runtime.
    pub fn new(
        config: &SyncConfig,
        users: Arc<dyn UserConfigProvider>,
        remote: Arc<dyn RemoteSyncClient>,
    ) -> Self {
        Self {
            queue: LibrarySyncQueue::spawn(config, users.clone(), remote.clone()),
            playback: PlaybackForwarder::new(users.clone(), remote.clone()),
            remote,
            users,
            catalog: ItemCatalog::new(),
        }
    }
}
