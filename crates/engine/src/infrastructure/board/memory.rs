//! In-process board adapter.

use async_trait::async_trait;
use std::sync::Arc;

use vigil_domain::{BoardEvent, EventRecord, RunSnapshot};

use crate::infrastructure::ports::ClockPort;

use super::event_log::EventLog;
use super::snapshots::SnapshotStore;
use super::BoardPort;

/// Board layer held entirely in process memory.
///
/// Suitable for a single-node deployment; the port boundary keeps the door
/// open for an external cache without touching any use case.
pub struct MemoryBoard {
    log: EventLog,
    snapshots: SnapshotStore,
}

impl MemoryBoard {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            log: EventLog::new(clock),
            snapshots: SnapshotStore::new(),
        }
    }
}

#[async_trait]
impl BoardPort for MemoryBoard {
    fn is_available(&self) -> bool {
        true
    }

    async fn append_event(&self, event: BoardEvent) -> Option<EventRecord> {
        Some(self.log.append(event).await)
    }

    async fn events_after(&self, cursor: i64, limit: usize) -> Vec<EventRecord> {
        self.log.read_after(cursor, limit).await
    }

    async fn latest_cursor(&self) -> i64 {
        self.log.latest_cursor().await
    }

    async fn recent_events(&self, limit: usize) -> Vec<EventRecord> {
        self.log.recent(limit).await
    }

    async fn wait_for_events(&self) {
        self.log.wait().await;
    }

    async fn upsert_snapshot(&self, snapshot: RunSnapshot) {
        self.snapshots.upsert(snapshot).await;
    }

    async fn active_runs(&self) -> Vec<RunSnapshot> {
        self.snapshots.active().await
    }

    async fn completed_runs(&self, limit: usize) -> Vec<RunSnapshot> {
        self.snapshots.completed(limit).await
    }

    async fn has_snapshots(&self) -> bool {
        !self.snapshots.is_empty()
    }
}
