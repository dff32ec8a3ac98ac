//! The fast board layer: snapshots, ranked indices, and the event log.
//!
//! Everything here is best-effort. The persistent store remains the source
//! of truth; any value in this layer can be rebuilt from it at any time, so
//! the port is infallible - an unavailable board yields neutral results
//! instead of errors, and the write path never depends on it.

mod event_log;
mod memory;
mod snapshots;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vigil_domain::{BoardEvent, EventRecord, RunSnapshot};

pub use event_log::{EventLog, EVENT_RETENTION};
pub use memory::MemoryBoard;
pub use snapshots::SnapshotStore;

/// Capability-checked access to the board layer.
#[async_trait]
pub trait BoardPort: Send + Sync {
    /// Whether the layer is serving at all. When false, every other method
    /// returns a neutral/empty result and observers must poll the store.
    fn is_available(&self) -> bool;

    /// Append an event to the global log, assigning its ordered id, and wake
    /// live subscribers. Returns None when the board is unavailable.
    async fn append_event(&self, event: BoardEvent) -> Option<EventRecord>;

    /// Events strictly after `cursor`, oldest first, at most `limit`.
    async fn events_after(&self, cursor: i64, limit: usize) -> Vec<EventRecord>;

    /// The id of the most recently appended event; 0 when the log is empty.
    async fn latest_cursor(&self) -> i64;

    /// Trailing window of the most recent events, oldest first.
    async fn recent_events(&self, limit: usize) -> Vec<EventRecord>;

    /// Wait until an event append occurs after this call.
    async fn wait_for_events(&self);

    /// Last-write-wins snapshot upsert, keyed on the snapshot's own
    /// `updated_at` recency. Also maintains the active/completed indices.
    async fn upsert_snapshot(&self, snapshot: RunSnapshot);

    /// Active runs ranked by most recent update.
    async fn active_runs(&self) -> Vec<RunSnapshot>;

    /// Most recently completed runs, bounded window.
    async fn completed_runs(&self, limit: usize) -> Vec<RunSnapshot>;

    /// Whether any snapshot is cached. False on a cold cache.
    async fn has_snapshots(&self) -> bool;
}

/// Board adapter used when the cache layer is disabled or unreachable.
///
/// Every read returns the neutral value and writes vanish; callers fall
/// back to the persistent store (observers via polling).
pub struct DisabledBoard;

#[async_trait]
impl BoardPort for DisabledBoard {
    fn is_available(&self) -> bool {
        false
    }

    async fn append_event(&self, _event: BoardEvent) -> Option<EventRecord> {
        None
    }

    async fn events_after(&self, _cursor: i64, _limit: usize) -> Vec<EventRecord> {
        Vec::new()
    }

    async fn latest_cursor(&self) -> i64 {
        0
    }

    async fn recent_events(&self, _limit: usize) -> Vec<EventRecord> {
        Vec::new()
    }

    async fn wait_for_events(&self) {
        // Nothing ever arrives; park until cancelled.
        std::future::pending::<()>().await;
    }

    async fn upsert_snapshot(&self, _snapshot: RunSnapshot) {}

    async fn active_runs(&self) -> Vec<RunSnapshot> {
        Vec::new()
    }

    async fn completed_runs(&self, _limit: usize) -> Vec<RunSnapshot> {
        Vec::new()
    }

    async fn has_snapshots(&self) -> bool {
        false
    }
}

/// Shared helper: pick the more recent of two snapshot writes.
pub(crate) fn newer_wins(
    existing: Option<&DateTime<Utc>>,
    incoming: &DateTime<Utc>,
) -> bool {
    match existing {
        Some(existing) => incoming >= existing,
        None => true,
    }
}
