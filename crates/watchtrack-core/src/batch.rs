//! Queue entries and the flush partitioning algorithm.
//!
//! A flush takes a snapshot of queued entries plus the current tracked
//! users and turns it into an ordered list of [`SyncBatch`]es:
//!
//! - per user, in configuration order: movie removes, movie adds, episode
//!   removes, episode adds;
//! - movie sub-batches go out whole;
//! - episode sub-batches are sorted by series id and cut into runs of the
//!   same series, one call per run.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::model::{ActionKind, MediaItem, TrackedUser};

/// One library change relevant to one tracked user.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub item: Arc<MediaItem>,
    pub user: Arc<TrackedUser>,
    pub action: ActionKind,
}

/// Build the entries for an item: one per (user, matching location).
///
/// An item under two of a user's locations yields two entries, and an item
/// shared by two users yields one per user.
pub fn match_entries(
    item: &Arc<MediaItem>,
    action: ActionKind,
    users: &[Arc<TrackedUser>],
) -> Vec<QueueEntry> {
    let mut entries = Vec::new();
    for user in users {
        for location in user.matching_locations(&item.path) {
            debug!(
                item = %item.name,
                account = %user.account,
                location = %location.display(),
                ?action,
                "creating library event"
            );
            entries.push(QueueEntry {
                item: Arc::clone(item),
                user: Arc::clone(user),
                action,
            });
        }
    }
    entries
}

// ─── Batches ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Movies,
    Episodes,
}

impl BatchKind {
    fn admits(self, item: &MediaItem) -> bool {
        match self {
            BatchKind::Movies => item.is_movie(),
            BatchKind::Episodes => item.episode().is_some(),
        }
    }
}

/// A single remote call's worth of items.
#[derive(Debug, Clone)]
pub struct SyncBatch {
    pub user: Arc<TrackedUser>,
    pub kind: BatchKind,
    pub action: ActionKind,
    pub items: Vec<Arc<MediaItem>>,
}

/// Result of partitioning a queue snapshot.
#[derive(Debug, Default)]
pub struct FlushPlan {
    pub batches: Vec<SyncBatch>,
    /// Entries that fall in no sub-batch: their user is no longer
    /// configured, the action is `Update`, or the item is neither a movie
    /// nor an episode.
    pub dropped: usize,
}

/// Sub-batch order within one user.
const SUB_BATCHES: [(BatchKind, ActionKind); 4] = [
    (BatchKind::Movies, ActionKind::Remove),
    (BatchKind::Movies, ActionKind::Add),
    (BatchKind::Episodes, ActionKind::Remove),
    (BatchKind::Episodes, ActionKind::Add),
];

/// Partition `entries` for the given users.
pub fn plan_flush(entries: &[QueueEntry], users: &[Arc<TrackedUser>]) -> FlushPlan {
    let mut plan = FlushPlan::default();

    for user in users {
        for (kind, action) in SUB_BATCHES {
            let items: Vec<Arc<MediaItem>> = entries
                .iter()
                .filter(|e| e.user.same_user(user) && e.action == action && kind.admits(&e.item))
                .map(|e| Arc::clone(&e.item))
                .collect();

            if items.is_empty() {
                debug!(account = %user.account, ?kind, ?action, "nothing to process");
                continue;
            }
            debug!(account = %user.account, ?kind, ?action, count = items.len(), "queued items to process");

            match kind {
                BatchKind::Movies => plan.batches.push(SyncBatch {
                    user: Arc::clone(user),
                    kind,
                    action,
                    items,
                }),
                BatchKind::Episodes => {
                    for run in chunk_by_series(items) {
                        plan.batches.push(SyncBatch {
                            user: Arc::clone(user),
                            kind,
                            action,
                            items: run,
                        });
                    }
                }
            }
        }
    }

    plan.dropped = entries
        .iter()
        .filter(|e| !is_planned(e, users))
        .count();
    if plan.dropped > 0 {
        debug!(dropped = plan.dropped, "queued entries outside every batch");
    }

    plan
}

fn is_planned(entry: &QueueEntry, users: &[Arc<TrackedUser>]) -> bool {
    users.iter().any(|u| u.same_user(&entry.user))
        && matches!(entry.action, ActionKind::Add | ActionKind::Remove)
        && entry.item.is_trackable()
}

/// Sort episodes by series id and split them into same-series runs.
///
/// The sort is stable, so episodes of one series keep their queue order.
/// Items without episode info sort under the nil id.
pub fn chunk_by_series(mut episodes: Vec<Arc<MediaItem>>) -> Vec<Vec<Arc<MediaItem>>> {
    episodes.sort_by_key(|ep| series_of(ep));

    let mut runs = Vec::new();
    let mut payload: Vec<Arc<MediaItem>> = Vec::new();
    let mut current = match episodes.first() {
        Some(first) => series_of(first),
        None => return runs,
    };

    for ep in episodes {
        let series = series_of(&ep);
        if series != current {
            runs.push(std::mem::take(&mut payload));
            current = series;
        }
        payload.push(ep);
    }

    if !payload.is_empty() {
        runs.push(payload);
    }
    runs
}

fn series_of(item: &MediaItem) -> Uuid {
    item.episode().map(|info| info.series_id).unwrap_or_default()
}
