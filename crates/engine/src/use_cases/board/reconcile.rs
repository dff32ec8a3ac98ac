//! Cold-start reconciliation of board snapshots from the persistent store.

use std::sync::Arc;

use vigil_domain::{Run, RunSnapshot, RunState, TurnRecord};

use crate::infrastructure::board::BoardPort;
use crate::infrastructure::ports::{RepoError, RunRepo, TurnRepo};

/// Rebuilds every snapshot and both ranked indices from the store.
///
/// Idempotent and safe to run concurrently with live traffic: each upsert is
/// last-write-wins on the snapshot's logical recency, so a fresher live
/// write is never overwritten by a stale rebuild. Never authoritative for
/// event ordering - only for latest-state snapshots.
pub struct Reconciler {
    runs: Arc<dyn RunRepo>,
    turns: Arc<dyn TurnRepo>,
    board: Arc<dyn BoardPort>,
}

impl Reconciler {
    pub fn new(
        runs: Arc<dyn RunRepo>,
        turns: Arc<dyn TurnRepo>,
        board: Arc<dyn BoardPort>,
    ) -> Self {
        Self { runs, turns, board }
    }

    /// Project every run in the store and backfill the board with it.
    /// Returns the number of snapshots written.
    pub async fn rebuild(&self) -> Result<usize, RepoError> {
        let snapshots = self.project_all().await?;
        let count = snapshots.len();
        for snapshot in snapshots {
            self.board.upsert_snapshot(snapshot).await;
        }
        tracing::info!(snapshots = count, "Reconciled board from store");
        Ok(count)
    }

    /// Project latest-state snapshots for all runs straight from the store,
    /// without touching the board. Also the polling fallback's data source.
    pub async fn project_all(&self) -> Result<Vec<RunSnapshot>, RepoError> {
        let runs = self.runs.list().await?;
        let mut snapshots = Vec::with_capacity(runs.len());
        for run in runs {
            let latest = self.turns.latest_for_run(run.id).await?;
            snapshots.push(project_run(&run, latest.as_ref()));
        }
        Ok(snapshots)
    }
}

/// Deterministic projection of one run row plus its latest turn.
///
/// The snapshot's `updated_at` is the run's latest logical mutation time, so
/// replaying the store always reproduces the same bytes.
pub fn project_run(run: &Run, latest_turn: Option<&TurnRecord>) -> RunSnapshot {
    let state = latest_turn
        .map(|t| t.state_after.clone())
        .unwrap_or_else(|| RunState::initial(&run.config));

    let mut updated_at = run.started_at;
    if let Some(turn) = latest_turn {
        updated_at = updated_at.max(turn.created_at);
    }
    if let Some(ended_at) = run.ended_at {
        updated_at = updated_at.max(ended_at);
    }

    RunSnapshot::project(run, &state, updated_at)
}
