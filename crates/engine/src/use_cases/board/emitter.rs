//! Event derivation and board updates for committed transitions.

use std::sync::Arc;

use vigil_domain::{
    derive_turn_events, run_started_event, Run, RunSnapshot, RunState,
};

use crate::infrastructure::board::BoardPort;
use crate::infrastructure::ports::ClockPort;

/// Turns committed state transitions into board events and snapshot updates.
///
/// Runs strictly after the persistent commit. The board is best-effort: an
/// unavailable board skips every step here without failing the turn, and the
/// next reconciler pass catches the snapshots up.
pub struct EventEmitter {
    board: Arc<dyn BoardPort>,
    clock: Arc<dyn ClockPort>,
}

impl EventEmitter {
    pub fn new(board: Arc<dyn BoardPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self { board, clock }
    }

    /// Announce a freshly created run.
    pub async fn run_started(&self, run: &Run, state: &RunState) {
        if !self.board.is_available() {
            tracing::debug!(run_id = %run.id, "Board unavailable, skipping run-started event");
            return;
        }
        let now = self.clock.now();
        let event = run_started_event(run, state, now);
        if self.board.append_event(event).await.is_none() {
            tracing::warn!(run_id = %run.id, "Board dropped run-started event");
        }
        self.board
            .upsert_snapshot(RunSnapshot::project(run, state, now))
            .await;
    }

    /// Derive and append all events for one committed turn, then refresh the
    /// run's snapshot. Event order is deterministic: milestone, items,
    /// sanity-critical, terminal.
    pub async fn transition_committed(
        &self,
        run: &Run,
        before: &RunState,
        after: &RunState,
        turn: u32,
    ) {
        if !self.board.is_available() {
            tracing::debug!(run_id = %run.id, turn, "Board unavailable, skipping events");
            return;
        }

        let now = self.clock.now();
        let events = derive_turn_events(run, before, after, turn, now);
        let count = events.len();
        for event in events {
            let kind = event.kind;
            if self.board.append_event(event).await.is_none() {
                tracing::warn!(run_id = %run.id, %kind, "Board dropped event");
            }
        }

        self.board
            .upsert_snapshot(RunSnapshot::project(run, after, now))
            .await;

        if count > 0 {
            tracing::debug!(run_id = %run.id, turn, events = count, "Published board events");
        }
    }

    /// Refresh a run's snapshot without deriving events (e.g. abandon).
    pub async fn snapshot_refreshed(&self, run: &Run, state: &RunState) {
        if !self.board.is_available() {
            return;
        }
        self.board
            .upsert_snapshot(RunSnapshot::project(run, state, self.clock.now()))
            .await;
    }
}
