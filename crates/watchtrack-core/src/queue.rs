//! Library sync queue: debounced batching of library changes.
//!
//! All queue and timer state lives in one worker task. [`LibrarySyncQueue`]
//! is the handle: `enqueue` matches the item against tracked users on the
//! caller's thread and hands the resulting entries to the worker, which
//! (re)arms its deadline. When the deadline passes with no further entries,
//! the worker swaps the pending entries out, partitions them and forwards
//! each batch to the remote client.
//!
//! State machine: `Idle -> Armed -> Armed (deadline pushed) -> Flushing ->
//! Idle`. Entries sent while a flush is running wait in the channel and are
//! flushed in the next cycle, so flush cycles never overlap and nothing is
//! lost.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::batch::{match_entries, plan_flush, QueueEntry};
use crate::config::{SyncConfig, UserConfigProvider};
use crate::error::QueueError;
use crate::model::{ActionKind, MediaItem};
use crate::remote::RemoteSyncClient;

// ─── Public types ───────────────────────────────────────────────────────

/// Observable state of the queue worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QueueState {
    /// No timer running, nothing queued.
    Idle,
    /// Timer running with `pending` entries queued.
    Armed { pending: usize },
    /// A flush of `entries` entries is in progress.
    Flushing { entries: usize },
}

/// Outcome of one flush cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Entries in the snapshot.
    pub entries: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
    /// Entries that matched no sub-batch at flush time.
    pub entries_dropped: usize,
    /// Shutdown interrupted the cycle before every batch went out.
    pub cancelled: bool,
}

enum Command {
    Enqueue {
        entries: Vec<QueueEntry>,
        at: Instant,
    },
    FlushNow(oneshot::Sender<FlushReport>),
}

// ─── Handle ─────────────────────────────────────────────────────────────

/// Handle to the library sync worker.
///
/// Must be created inside a Tokio runtime. Dropping the handle cancels the
/// worker; call [`shutdown`](Self::shutdown) to also wait for it.
pub struct LibrarySyncQueue {
    users: Arc<dyn UserConfigProvider>,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<QueueState>,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for LibrarySyncQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibrarySyncQueue")
            .field("state", &*self.state.borrow())
            .field("closed", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl LibrarySyncQueue {
    /// Spawn the worker task and return its handle.
    pub fn spawn(
        config: &SyncConfig,
        users: Arc<dyn UserConfigProvider>,
        remote: Arc<dyn RemoteSyncClient>,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(QueueState::Idle);
        let shutdown = CancellationToken::new();

        let worker = Worker {
            commands: rx,
            users: Arc::clone(&users),
            remote,
            debounce: config.debounce,
            state: state_tx,
            shutdown: shutdown.clone(),
            pending: Vec::new(),
            deadline: None,
        };
        let handle = tokio::spawn(worker.run());

        Self {
            users,
            commands,
            state,
            shutdown,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Queue `item` for every tracked user whose monitored locations
    /// contain it, and (re)start the debounce timer.
    ///
    /// Returns the number of entries created. Zero means nothing matched and
    /// the timer was left alone.
    pub fn enqueue(&self, item: Arc<MediaItem>, action: ActionKind) -> Result<usize, QueueError> {
        if item.path.as_os_str().is_empty() {
            return Err(QueueError::InvalidArgument(format!(
                "item {} has no path",
                item.id
            )));
        }
        if !item.path.is_absolute() {
            return Err(QueueError::InvalidArgument(format!(
                "item {} has relative path {}",
                item.id,
                item.path.display()
            )));
        }
        if self.shutdown.is_cancelled() {
            return Err(QueueError::Closed);
        }

        let users = self.users.tracked_users();
        if users.is_empty() {
            debug!(item = %item.name, "no tracked users configured");
            return Ok(0);
        }

        let entries = match_entries(&item, action, &users);
        if entries.is_empty() {
            debug!(item = %item.name, path = %item.path.display(), "item outside monitored locations");
            return Ok(0);
        }

        let count = entries.len();
        self.commands
            .send(Command::Enqueue {
                entries,
                at: Instant::now(),
            })
            .map_err(|_| QueueError::Closed)?;
        Ok(count)
    }

    /// Flush immediately instead of waiting for the timer.
    ///
    /// Runs after any entries already handed to the worker.
    pub async fn flush_now(&self) -> Result<FlushReport, QueueError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::FlushNow(tx))
            .map_err(|_| QueueError::Closed)?;
        rx.await.map_err(|_| QueueError::Closed)
    }

    pub fn state(&self) -> QueueState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueueState> {
        self.state.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop the worker, cancelling an in-flight flush, and wait for it.
    /// Entries still pending are discarded.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("library sync worker ended abnormally: {e}");
            }
        }
    }
}

impl Drop for LibrarySyncQueue {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// ─── Worker ─────────────────────────────────────────────────────────────

struct Worker {
    commands: mpsc::UnboundedReceiver<Command>,
    users: Arc<dyn UserConfigProvider>,
    remote: Arc<dyn RemoteSyncClient>,
    debounce: Duration,
    state: watch::Sender<QueueState>,
    shutdown: CancellationToken,
    pending: Vec<QueueEntry>,
    /// `Some` while armed.
    deadline: Option<Instant>,
}

impl Worker {
    async fn run(mut self) {
        info!(debounce = ?self.debounce, "library sync queue started");

        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(Command::Enqueue { entries, at }) => self.arm(entries, at),
                    Some(Command::FlushNow(reply)) => {
                        let report = self.flush().await;
                        let _ = reply.send(report);
                    }
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    debug!("queue timer elapsed");
                    self.flush().await;
                }
            }
        }

        if !self.pending.is_empty() {
            warn!(discarded = self.pending.len(), "library sync queue stopped with pending entries");
        }
        self.pending.clear();
        self.deadline = None;
        self.state.send_replace(QueueState::Idle);
        info!("library sync queue stopped");
    }

    fn arm(&mut self, entries: Vec<QueueEntry>, at: Instant) {
        let next = at + self.debounce;
        self.deadline = Some(match self.deadline {
            Some(current) => {
                debug!("resetting queue timer");
                current.max(next)
            }
            None => {
                debug!("starting queue timer");
                next
            }
        });
        self.pending.extend(entries);
        self.state.send_replace(QueueState::Armed {
            pending: self.pending.len(),
        });
    }

    async fn flush(&mut self) -> FlushReport {
        self.deadline = None;
        let snapshot = std::mem::take(&mut self.pending);

        if snapshot.is_empty() {
            debug!("no queued library events, queue timer idle");
            self.state.send_replace(QueueState::Idle);
            return FlushReport::default();
        }

        info!(entries = snapshot.len(), "processing queued library events");
        self.state.send_replace(QueueState::Flushing {
            entries: snapshot.len(),
        });

        let users = self.users.tracked_users();
        let plan = plan_flush(&snapshot, &users);
        let mut report = FlushReport {
            entries: snapshot.len(),
            entries_dropped: plan.dropped,
            ..Default::default()
        };

        for batch in &plan.batches {
            let call = self
                .remote
                .send_library_batch(&batch.items, &batch.user, batch.action);
            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => None,
                result = call => Some(result),
            };

            match outcome {
                Some(Ok(())) => {
                    report.batches_sent += 1;
                    debug!(
                        account = %batch.user.account,
                        kind = ?batch.kind,
                        action = ?batch.action,
                        count = batch.items.len(),
                        "library batch sent"
                    );
                }
                Some(Err(e)) => {
                    report.batches_failed += 1;
                    warn!(
                        account = %batch.user.account,
                        kind = ?batch.kind,
                        action = ?batch.action,
                        count = batch.items.len(),
                        error = %e,
                        "library batch failed"
                    );
                }
                None => {
                    report.cancelled = true;
                    warn!("flush cancelled by shutdown");
                    break;
                }
            }
        }

        self.state.send_replace(QueueState::Idle);
        info!(
            entries = report.entries,
            sent = report.batches_sent,
            failed = report.batches_failed,
            dropped = report.entries_dropped,
            cancelled = report.cancelled,
            "library events processed"
        );
        report
    }
}
