//! Host event adapter.
//!
//! The media server posts library and playback notifications here. Library
//! changes go to the sync queue; playback goes straight to the forwarder.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use watchtrack_core::{
    ActionKind, FlushReport, MediaItem, PlaybackEvent, PlaybackEventKind, QueueError, QueueState,
};

use crate::routes::remote_error;
use crate::state::AppState;

// ─── Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryEventKind {
    ItemAdded,
    ItemRemoved,
    /// Metadata refresh; only updates the catalog.
    ItemUpdated,
}

#[derive(Debug, Deserialize)]
pub struct LibraryEventRequest {
    pub event: LibraryEventKind,
    #[serde(default)]
    pub item: Option<MediaItem>,
}

#[derive(Debug, Serialize)]
pub struct LibraryEventResponse {
    /// Queue entries created for this notification.
    pub entries: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackRequest {
    pub event: PlaybackEventKind,
    #[serde(flatten)]
    pub playback: PlaybackEvent,
}

#[derive(Debug, Serialize)]
pub struct PlaybackResponse {
    /// Whether a status update reached the remote service.
    pub sent: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub queue: QueueState,
    pub tracked_users: usize,
    /// Items manual actions can address.
    pub catalog_items: usize,
}

// ─── Handlers ───────────────────────────────────────────────────────────

fn queue_error(e: QueueError) -> (StatusCode, String) {
    match e {
        QueueError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        QueueError::Closed => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

/// POST /host/library
pub async fn library_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LibraryEventRequest>,
) -> Result<Json<LibraryEventResponse>, (StatusCode, String)> {
    let item = body
        .item
        .map(Arc::new)
        .ok_or_else(|| queue_error(QueueError::InvalidArgument("event has no item".into())))?;

    let entries = match body.event {
        LibraryEventKind::ItemAdded => {
            let entries = state
                .queue
                .enqueue(item.clone(), ActionKind::Add)
                .map_err(queue_error)?;
            state.catalog.upsert(item).await;
            entries
        }
        LibraryEventKind::ItemRemoved => {
            let entries = state
                .queue
                .enqueue(item.clone(), ActionKind::Remove)
                .map_err(queue_error)?;
            state.catalog.remove(item.id).await;
            entries
        }
        LibraryEventKind::ItemUpdated => {
            state.catalog.upsert(item).await;
            0
        }
    };

    Ok(Json(LibraryEventResponse { entries }))
}

/// POST /host/playback
pub async fn playback_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlaybackRequest>,
) -> Result<Json<PlaybackResponse>, (StatusCode, String)> {
    if body.event == PlaybackEventKind::Start
        && state.playback.resolve_user(&body.playback).is_some()
    {
        state
            .catalog
            .upsert(Arc::new(body.playback.item.clone()))
            .await;
    }

    let sent = state
        .playback
        .handle(body.event, &body.playback)
        .await
        .map_err(|e| {
            tracing::warn!(item = %body.playback.item.name, error = %e, "playback status failed");
            remote_error(e)
        })?;

    Ok(Json(PlaybackResponse { sent }))
}

/// POST /host/flush
pub async fn flush(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FlushReport>, (StatusCode, String)> {
    let report = state.queue.flush_now().await.map_err(queue_error)?;
    Ok(Json(report))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.queue.is_closed() { "closing" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        queue: state.queue.state(),
        tracked_users: state.users.tracked_users().len(),
        catalog_items: state.catalog.len().await,
    })
}
