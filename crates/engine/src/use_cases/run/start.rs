//! Start (or resume) a run for an actor.

use std::sync::Arc;

use vigil_domain::{ActorId, ActorKind, Run, RunConfig, RunState};

use crate::infrastructure::ports::{ClockPort, RepoError, RunRepo, TurnRepo};
use crate::use_cases::board::EventEmitter;

/// Result of a start request: the run, its current state, and whether an
/// existing active run was resumed instead of a new one created.
#[derive(Debug, Clone)]
pub struct StartedRun {
    pub run: Run,
    pub state: RunState,
    pub resumed: bool,
}

pub struct StartRun {
    runs: Arc<dyn RunRepo>,
    turns: Arc<dyn TurnRepo>,
    emitter: Arc<EventEmitter>,
    clock: Arc<dyn ClockPort>,
    config: RunConfig,
}

impl StartRun {
    pub fn new(
        runs: Arc<dyn RunRepo>,
        turns: Arc<dyn TurnRepo>,
        emitter: Arc<EventEmitter>,
        clock: Arc<dyn ClockPort>,
        config: RunConfig,
    ) -> Self {
        Self {
            runs,
            turns,
            emitter,
            clock,
            config,
        }
    }

    /// Never more than one concurrently active run per actor: an existing
    /// active run is returned as-is, otherwise a fresh one is created.
    pub async fn execute(
        &self,
        actor: ActorId,
        actor_kind: ActorKind,
    ) -> Result<StartedRun, StartRunError> {
        if let Some(existing) = self.runs.find_active_by_actor(&actor).await? {
            let state = match self.turns.latest_for_run(existing.id).await? {
                Some(turn) => turn.state_after,
                None => RunState::initial(&existing.config),
            };
            tracing::debug!(run_id = %existing.id, "Resuming active run");
            return Ok(StartedRun {
                run: existing,
                state,
                resumed: true,
            });
        }

        let run = Run::new(actor, actor_kind, self.config.clone(), self.clock.now());
        let state = RunState::initial(&run.config);
        self.runs.create(&run).await?;

        // Board updates happen only after the durable write succeeded.
        self.emitter.run_started(&run, &state).await;

        tracing::info!(run_id = %run.id, kind = %run.actor_kind, "Started run");
        Ok(StartedRun {
            run,
            state,
            resumed: false,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartRunError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::board::{BoardPort, MemoryBoard};
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::sqlite::connection::memory_pool;
    use crate::infrastructure::sqlite::{SqliteRunRepo, SqliteTurnRepo};
    use vigil_domain::BoardEventKind;

    async fn use_case() -> (StartRun, Arc<MemoryBoard>) {
        let pool = memory_pool().await;
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let runs = Arc::new(SqliteRunRepo::new(pool.clone(), clock.clone()));
        let turns = Arc::new(SqliteTurnRepo::new(pool, clock.clone()));
        let board = Arc::new(MemoryBoard::new(clock.clone()));
        let emitter = Arc::new(EventEmitter::new(board.clone(), clock.clone()));
        (
            StartRun::new(runs, turns, emitter, clock, RunConfig::default()),
            board,
        )
    }

    #[tokio::test]
    async fn fresh_start_creates_run_and_emits_event() {
        let (start, board) = use_case().await;
        let started = start
            .execute(ActorId::new("0xabc"), ActorKind::Human)
            .await
            .expect("start");

        assert!(!started.resumed);
        assert_eq!(started.run.current_turn, 0);
        assert_eq!(started.state.sanity, 100);

        let events = board.recent_events(10).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.kind, BoardEventKind::RunStarted);
    }

    #[tokio::test]
    async fn second_start_resumes_the_active_run() {
        let (start, board) = use_case().await;
        let first = start
            .execute(ActorId::new("0xabc"), ActorKind::Human)
            .await
            .expect("start");
        let second = start
            .execute(ActorId::new("0xabc"), ActorKind::Human)
            .await
            .expect("resume");

        assert!(second.resumed);
        assert_eq!(second.run.id, first.run.id);

        // No second run-started event for a resume.
        assert_eq!(board.recent_events(10).await.len(), 1);
    }

    #[tokio::test]
    async fn different_actors_get_different_runs() {
        let (start, _) = use_case().await;
        let a = start
            .execute(ActorId::new("0xaaa"), ActorKind::Human)
            .await
            .expect("start a");
        let b = start
            .execute(ActorId::new("0xbbb"), ActorKind::Agent)
            .await
            .expect("start b");
        assert_ne!(a.run.id, b.run.id);
        assert_eq!(b.run.actor_kind, ActorKind::Agent);
    }
}
