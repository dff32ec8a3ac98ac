//! Snapshot query - the polling fallback for observers.

use std::sync::Arc;

use vigil_domain::{EventRecord, RunSnapshot, RunStatus};

use crate::infrastructure::board::BoardPort;
use crate::infrastructure::ports::RepoError;

use super::reconcile::Reconciler;

/// How many recently-completed runs the board exposes.
pub const COMPLETED_WINDOW: usize = 20;

/// How many trailing events the poll fallback returns.
pub const EVENT_WINDOW: usize = 50;

/// Everything an observer needs in one poll.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub active: Vec<RunSnapshot>,
    pub completed: Vec<RunSnapshot>,
    pub events: Vec<EventRecord>,
}

/// Serves the full board state, from cache when warm and from the store
/// otherwise. Safe to poll repeatedly.
pub struct BoardQuery {
    board: Arc<dyn BoardPort>,
    reconciler: Arc<Reconciler>,
}

impl BoardQuery {
    pub fn new(board: Arc<dyn BoardPort>, reconciler: Arc<Reconciler>) -> Self {
        Self { board, reconciler }
    }

    pub async fn execute(&self) -> Result<BoardView, RepoError> {
        if self.board.is_available() {
            // Cold cache: backfill once from the store, then serve from it.
            if !self.board.has_snapshots().await {
                self.reconciler.rebuild().await?;
            }
            return Ok(BoardView {
                active: self.board.active_runs().await,
                completed: self.board.completed_runs(COMPLETED_WINDOW).await,
                events: self.board.recent_events(EVENT_WINDOW).await,
            });
        }

        // Board gone entirely: project straight from the persistent store.
        // Events live only in the board layer, so the fallback carries none;
        // observers keep their last-seen events and poll snapshots.
        let mut active = Vec::new();
        let mut completed = Vec::new();
        for snapshot in self.reconciler.project_all().await? {
            if snapshot.status == RunStatus::Active {
                active.push(snapshot);
            } else {
                completed.push(snapshot);
            }
        }
        active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        completed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        completed.truncate(COMPLETED_WINDOW);

        Ok(BoardView {
            active,
            completed,
            events: Vec::new(),
        })
    }
}
