//! In-process append-only event log.
//!
//! One global, monotonically ordered log shared by all runs. Ids are
//! assigned at append time, strictly increasing, and are the only valid
//! resumption token. The log keeps a bounded trailing window: every append
//! opportunistically trims entries older than [`EVENT_RETENTION`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock};

use vigil_domain::{BoardEvent, EventRecord};

use crate::infrastructure::ports::ClockPort;

/// Events older than this are trimmed; observers further behind must fall
/// back to snapshot polling.
pub const EVENT_RETENTION: Duration = Duration::from_secs(72 * 60 * 60);

/// Append-only log with a time-bounded retention window.
pub struct EventLog {
    entries: RwLock<VecDeque<EventRecord>>,
    next_id: AtomicI64,
    notify: Notify,
    retention: chrono::Duration,
    clock: Arc<dyn ClockPort>,
}

impl EventLog {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self::with_retention(clock, EVENT_RETENTION)
    }

    pub fn with_retention(clock: Arc<dyn ClockPort>, retention: Duration) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            next_id: AtomicI64::new(1),
            notify: Notify::new(),
            retention: chrono::Duration::from_std(retention)
                .unwrap_or_else(|_| chrono::Duration::hours(72)),
            clock,
        }
    }

    /// Append one event, assign its id, trim expired entries, wake waiters.
    pub async fn append(&self, event: BoardEvent) -> EventRecord {
        let record = EventRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            event,
        };

        let cutoff = self.clock.now() - self.retention;
        {
            let mut entries = self.entries.write().await;
            while entries
                .front()
                .map_or(false, |e| e.event.created_at < cutoff)
            {
                entries.pop_front();
            }
            entries.push_back(record.clone());
        }

        self.notify.notify_waiters();
        record
    }

    /// Events strictly after `cursor`, oldest first, at most `limit`.
    pub async fn read_after(&self, cursor: i64, limit: usize) -> Vec<EventRecord> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.id > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Id of the latest event, or 0 when the log is empty.
    pub async fn latest_cursor(&self) -> i64 {
        self.entries.read().await.back().map_or(0, |e| e.id)
    }

    /// The trailing `limit` events, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<EventRecord> {
        let entries = self.entries.read().await;
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Wait for the next append.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
