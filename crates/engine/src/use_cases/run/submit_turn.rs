//! Turn resolution - one accepted action against one run.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

use vigil_domain::{apply_delta, ChosenAction, RunConfig, RunId, RunState, RunStatus, TurnRecord};

use crate::infrastructure::ports::{
    ClockPort, NarrativePort, NarrativeRequest, ProviderError, RepoError, RunRepo, TurnDigestEntry,
    TurnRepo,
};
use crate::use_cases::board::EventEmitter;

/// Resolves player turns.
///
/// Turns for one run are serialized - each run has exactly one in-flight
/// turn at a time - while different runs proceed fully in parallel. The
/// provider call is the only unbounded-feeling wait in the critical path and
/// it is capped by the resilient client's timeout.
pub struct SubmitTurn {
    runs: Arc<dyn RunRepo>,
    turns: Arc<dyn TurnRepo>,
    narrative: Arc<dyn NarrativePort>,
    emitter: Arc<EventEmitter>,
    clock: Arc<dyn ClockPort>,
    config: RunConfig,
    turn_locks: DashMap<RunId, Arc<tokio::sync::Mutex<()>>>,
}

impl SubmitTurn {
    pub fn new(
        runs: Arc<dyn RunRepo>,
        turns: Arc<dyn TurnRepo>,
        narrative: Arc<dyn NarrativePort>,
        emitter: Arc<EventEmitter>,
        clock: Arc<dyn ClockPort>,
        config: RunConfig,
    ) -> Self {
        Self {
            runs,
            turns,
            narrative,
            emitter,
            clock,
            config,
            turn_locks: DashMap::new(),
        }
    }

    pub async fn execute(
        &self,
        run_id: RunId,
        action: ChosenAction,
    ) -> Result<TurnRecord, TurnError> {
        let lock = self
            .turn_locks
            .entry(run_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut run = self
            .runs
            .get(run_id)
            .await?
            .ok_or(TurnError::RunNotFound(run_id))?;

        if !run.is_active() {
            return Err(TurnError::NotEligible {
                run_id,
                status: run.status,
            });
        }

        let prev_state = match self.turns.latest_for_run(run_id).await? {
            Some(turn) => turn.state_after,
            None => RunState::initial(&run.config),
        };

        // Terminal state wins over a stale-active status row.
        if prev_state.is_game_over {
            return Err(TurnError::AlreadyOver(run_id));
        }

        let turn_number = run.current_turn + 1;
        let history = self.history_digest(run_id).await?;

        let request = NarrativeRequest {
            history,
            action: action.clone(),
            known_rules: prev_state.rules.clone(),
            inventory: prev_state.inventory.clone(),
            sanity: prev_state.sanity,
            location: prev_state.location.clone(),
            turn: turn_number,
            temperature: self.config.temperature,
        };

        // Provider failure rejects the whole turn: nothing below runs, no
        // record is written, and the caller is told to retry.
        let started = Instant::now();
        let outcome = self.narrative.next_scene(request).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let next_state = apply_delta(&prev_state, &outcome.delta);

        run.current_turn = turn_number;
        run.config = self.config.clone();
        if next_state.is_game_over {
            let status = if next_state.is_victory {
                RunStatus::Completed
            } else {
                RunStatus::Failed
            };
            run.finish(status, Some(next_state.is_victory), self.clock.now())
                .map_err(|e| TurnError::Repo(RepoError::constraint(e)))?;
        }

        let record = TurnRecord {
            run_id,
            turn_number,
            action,
            state_before: prev_state.clone(),
            state_after: next_state.clone(),
            provider_payload: outcome.raw,
            latency_ms,
            created_at: self.clock.now(),
        };

        // The one atomic unit: turn row + run mutations commit together.
        self.turns.commit_turn(&run, &record).await?;

        // Event derivation strictly after the durable commit; board failures
        // never surface to the caller.
        self.emitter
            .transition_committed(&run, &prev_state, &next_state, turn_number)
            .await;

        if run.status.is_terminal() {
            self.turn_locks.remove(&run_id);
        }

        tracing::info!(
            run_id = %run_id,
            turn = turn_number,
            latency_ms,
            sanity = next_state.sanity,
            game_over = next_state.is_game_over,
            "Resolved turn"
        );
        Ok(record)
    }

    /// Ordered digest of prior turns, oldest first, bounded by config.
    async fn history_digest(&self, run_id: RunId) -> Result<Vec<TurnDigestEntry>, RepoError> {
        let turns = self.turns.list_for_run(run_id).await?;
        let skip = turns.len().saturating_sub(self.config.max_history_turns);
        Ok(turns
            .into_iter()
            .skip(skip)
            .map(|t| TurnDigestEntry {
                turn: t.turn_number,
                action: t.action.text,
                narrative: t.state_after.narrative,
            })
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),

    #[error("run {run_id} is not eligible for turns (status: {status})")]
    NotEligible { run_id: RunId, status: RunStatus },

    #[error("run {0} has already ended")]
    AlreadyOver(RunId),

    /// Provider failed; the turn was rejected and can be retried.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl TurnError {
    /// Whether the caller should retry the same submission.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}
