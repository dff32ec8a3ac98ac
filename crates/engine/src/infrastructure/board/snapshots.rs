//! Snapshot store and ranked run indices.

use dashmap::DashMap;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use vigil_domain::{RunId, RunSnapshot};

use super::newer_wins;

/// Completed index keeps at most this many entries; older completions age
/// out of the board and live only in the persistent store.
const COMPLETED_INDEX_MAX: usize = 100;

/// Latest-known projection per run, plus the active/completed indices.
///
/// Writes are last-write-wins keyed on the snapshot's `updated_at`, which is
/// safe because every snapshot is re-derivable from the store. The two index
/// updates are eventually consistent with each other, not atomic.
pub struct SnapshotStore {
    snapshots: DashMap<RunId, RunSnapshot>,
    active: RwLock<HashMap<RunId, DateTime<Utc>>>,
    completed: RwLock<HashMap<RunId, DateTime<Utc>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshots: DashMap::new(),
            active: RwLock::new(HashMap::new()),
            completed: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert a snapshot and maintain the indices.
    pub async fn upsert(&self, snapshot: RunSnapshot) {
        let run_id = snapshot.run_id;

        {
            let existing = self.snapshots.get(&run_id);
            if !newer_wins(existing.map(|s| s.updated_at).as_ref(), &snapshot.updated_at) {
                return;
            }
        }

        let is_active = snapshot.status == vigil_domain::RunStatus::Active;
        let rank_time = snapshot.ended_at.unwrap_or(snapshot.updated_at);
        self.snapshots.insert(run_id, snapshot);

        if is_active {
            self.active.write().await.insert(run_id, rank_time);
            self.completed.write().await.remove(&run_id);
        } else {
            self.active.write().await.remove(&run_id);
            let mut completed = self.completed.write().await;
            completed.insert(run_id, rank_time);
            if completed.len() > COMPLETED_INDEX_MAX {
                if let Some(oldest) = completed
                    .iter()
                    .min_by_key(|(_, t)| **t)
                    .map(|(id, _)| *id)
                {
                    completed.remove(&oldest);
                }
            }
        }
    }

    pub fn get(&self, run_id: RunId) -> Option<RunSnapshot> {
        self.snapshots.get(&run_id).map(|s| s.clone())
    }

    /// Active runs ranked by most recent update, newest first.
    pub async fn active(&self) -> Vec<RunSnapshot> {
        let index = self.active.read().await;
        self.ranked(&index)
    }

    /// Completed runs ranked by end time, newest first, bounded by `limit`.
    pub async fn completed(&self, limit: usize) -> Vec<RunSnapshot> {
        let index = self.completed.read().await;
        let mut runs = self.ranked(&index);
        runs.truncate(limit);
        runs
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn ranked(&self, index: &HashMap<RunId, DateTime<Utc>>) -> Vec<RunSnapshot> {
        let mut entries: Vec<(RunId, DateTime<Utc>)> =
            index.iter().map(|(id, t)| (*id, *t)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
            .into_iter()
            .filter_map(|(id, _)| self.snapshots.get(&id).map(|s| s.clone()))
            .collect()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
