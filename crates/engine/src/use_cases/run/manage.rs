//! Run reads and lifecycle management outside the turn path.

use std::sync::Arc;

use vigil_domain::{Run, RunId, RunState, RunStatus};

use crate::infrastructure::ports::{ClockPort, RepoError, RunRepo, TurnRepo};
use crate::use_cases::board::EventEmitter;

/// Fetch a run together with its current state.
pub struct GetRun {
    runs: Arc<dyn RunRepo>,
    turns: Arc<dyn TurnRepo>,
}

impl GetRun {
    pub fn new(runs: Arc<dyn RunRepo>, turns: Arc<dyn TurnRepo>) -> Self {
        Self { runs, turns }
    }

    pub async fn execute(&self, run_id: RunId) -> Result<Option<(Run, RunState)>, RepoError> {
        let Some(run) = self.runs.get(run_id).await? else {
            return Ok(None);
        };
        let state = match self.turns.latest_for_run(run_id).await? {
            Some(turn) => turn.state_after,
            None => RunState::initial(&run.config),
        };
        Ok(Some((run, state)))
    }
}

/// Mark an active run abandoned.
///
/// Abandonment is terminal but not a played outcome: the victory flag stays
/// unknown and no victory/death event reaches the board. The snapshot still
/// moves to the completed side so observers stop seeing the run as live.
pub struct AbandonRun {
    runs: Arc<dyn RunRepo>,
    turns: Arc<dyn TurnRepo>,
    emitter: Arc<EventEmitter>,
    clock: Arc<dyn ClockPort>,
}

impl AbandonRun {
    pub fn new(
        runs: Arc<dyn RunRepo>,
        turns: Arc<dyn TurnRepo>,
        emitter: Arc<EventEmitter>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            runs,
            turns,
            emitter,
            clock,
        }
    }

    pub async fn execute(&self, run_id: RunId) -> Result<Run, ManageError> {
        let mut run = self
            .runs
            .get(run_id)
            .await?
            .ok_or(ManageError::RunNotFound(run_id))?;

        if !run.is_active() {
            return Err(ManageError::NotEligible {
                run_id,
                status: run.status,
            });
        }

        run.finish(RunStatus::Abandoned, None, self.clock.now())
            .map_err(|e| ManageError::Repo(RepoError::constraint(e)))?;
        self.runs.update(&run).await?;

        let state = match self.turns.latest_for_run(run_id).await? {
            Some(turn) => turn.state_after,
            None => RunState::initial(&run.config),
        };
        self.emitter.snapshot_refreshed(&run, &state).await;

        tracing::info!(run_id = %run_id, "Abandoned run");
        Ok(run)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManageError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),

    #[error("run {run_id} is not eligible (status: {status})")]
    NotEligible { run_id: RunId, status: RunStatus },

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
    use chrono::Utc;
    use vigil_domain::{ActorId, ActorKind, RunConfig};

    struct Fixture {
        get: GetRun,
        abandon: AbandonRun,
        runs: Arc<SqliteRunRepo>,
        board: Arc<MemoryBoard>,
    }

    async fn fixture() -> Fixture {
        let pool = memory_pool().await;
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let runs = Arc::new(SqliteRunRepo::new(pool.clone(), clock.clone()));
        let turns = Arc::new(SqliteTurnRepo::new(pool, clock.clone()));
        let board = Arc::new(MemoryBoard::new(clock.clone()));
        let emitter = Arc::new(EventEmitter::new(board.clone(), clock.clone()));
        Fixture {
            get: GetRun::new(runs.clone(), turns.clone()),
            abandon: AbandonRun::new(runs.clone(), turns, emitter, clock),
            runs,
            board,
        }
    }

    async fn seeded_run(fixture: &Fixture) -> Run {
        use crate::infrastructure::ports::RunRepo;
        let run = Run::new(
            ActorId::new("0xabc"),
            ActorKind::Human,
            RunConfig::default(),
            Utc::now(),
        );
        fixture.runs.create(&run).await.expect("create");
        run
    }

    #[tokio::test]
    async fn get_returns_run_with_initial_state_before_first_turn() {
        let fixture = fixture().await;
        let run = seeded_run(&fixture).await;

        let (loaded, state) = fixture
            .get
            .execute(run.id)
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(loaded.id, run.id);
        assert_eq!(state.sanity, 100);
    }

    #[tokio::test]
    async fn abandon_is_terminal_without_outcome() {
        let fixture = fixture().await;
        let run = seeded_run(&fixture).await;

        let abandoned = fixture.abandon.execute(run.id).await.expect("abandon");
        assert_eq!(abandoned.status, RunStatus::Abandoned);
        assert!(abandoned.victory.is_none());
        assert!(abandoned.ended_at.is_some());

        // No victory/death event, but the snapshot left the active side.
        assert!(fixture.board.recent_events(10).await.is_empty());
        assert_eq!(fixture.board.completed_runs(10).await.len(), 1);

        // Idempotent rejection on a second abandon.
        let err = fixture.abandon.execute(run.id).await.expect_err("rejected");
        assert!(matches!(err, ManageError::NotEligible { .. }));
    }
}
