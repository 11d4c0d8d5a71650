//! In-memory catalog of items the host has reported.
//!
//! Manual actions address items by id; the catalog resolves those ids to
//! the full item the remote service needs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;
use watchtrack_core::MediaItem;

#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: RwLock<HashMap<Uuid, Arc<MediaItem>>>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    pub async fn upsert(&self, item: Arc<MediaItem>) {
        self.items.write().await.insert(item.id, item);
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<MediaItem>> {
        self.items.write().await.remove(&id)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<MediaItem>> {
        self.items.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}
