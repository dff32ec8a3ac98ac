//! Turn repository implementation for SQLite.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use vigil_domain::{Run, RunId, TurnRecord};

use crate::infrastructure::ports::{ClockPort, RepoError, TurnRepo};

use super::run_repo::parse_timestamp;

/// Repository for the append-only turn history.
pub struct SqliteTurnRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteTurnRepo {
    pub fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl TurnRepo for SqliteTurnRepo {
    async fn latest_for_run(&self, run_id: RunId) -> Result<Option<TurnRecord>, RepoError> {
        let row = sqlx::query(
            "SELECT * FROM turns WHERE run_id = ? ORDER BY turn_number DESC LIMIT 1",
        )
        .bind(run_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("latest_turn", e))?;

        row.map(|r| row_to_turn(&r)).transpose()
    }

    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<TurnRecord>, RepoError> {
        let rows = sqlx::query("SELECT * FROM turns WHERE run_id = ? ORDER BY turn_number ASC")
            .bind(run_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("list_turns", e))?;

        rows.iter().map(row_to_turn).collect()
    }

    async fn commit_turn(&self, run: &Run, record: &TurnRecord) -> Result<(), RepoError> {
        let action_json = serde_json::to_string(&record.action)
            .map_err(|e| RepoError::serialization(e))?;
        let before_json = serde_json::to_string(&record.state_before)
            .map_err(|e| RepoError::serialization(e))?;
        let after_json = serde_json::to_string(&record.state_after)
            .map_err(|e| RepoError::serialization(e))?;
        let payload_json = serde_json::to_string(&record.provider_payload)
            .map_err(|e| RepoError::serialization(e))?;
        let config_json = serde_json::to_string(&run.config)
            .map_err(|e| RepoError::serialization(e))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("commit_turn", e))?;

        sqlx::query(
            r#"
            INSERT INTO turns (run_id, turn_number, action_json, state_before_json,
                               state_after_json, provider_payload_json, latency_ms, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.run_id.to_string())
        .bind(i64::from(record.turn_number))
        .bind(action_json)
        .bind(before_json)
        .bind(after_json)
        .bind(payload_json)
        .bind(record.latency_ms as i64)
        .bind(record.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("commit_turn", e))?;

        let result = sqlx::query(
            r#"
            UPDATE runs
            SET status = ?, current_turn = ?, ended_at = ?, victory = ?,
                config_json = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(run.status.to_string())
        .bind(i64::from(run.current_turn))
        .bind(run.ended_at.map(|t| t.to_rfc3339()))
        .bind(run.victory)
        .bind(config_json)
        .bind(self.clock.now().to_rfc3339())
        .bind(run.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("commit_turn", e))?;

        if result.rows_affected() == 0 {
            // Rolls back the turn insert on drop.
            return Err(RepoError::not_found("Run", run.id));
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("commit_turn", e))?;

        tracing::debug!(
            run_id = %record.run_id,
            turn = record.turn_number,
            latency_ms = record.latency_ms,
            "Committed turn"
        );
        Ok(())
    }
}

fn row_to_turn(row: &SqliteRow) -> Result<TurnRecord, RepoError> {
    let run_id_str: String = row.get("run_id");
    let turn_number: i64 = row.get("turn_number");
    let action_json: String = row.get("action_json");
    let before_json: String = row.get("state_before_json");
    let after_json: String = row.get("state_after_json");
    let payload_json: String = row.get("provider_payload_json");
    let latency_ms: i64 = row.get("latency_ms");
    let created_at: String = row.get("created_at");

    let run_id = Uuid::parse_str(&run_id_str)
        .map_err(|e| RepoError::serialization(format!("turn run id: {e}")))?;

    Ok(TurnRecord {
        run_id: RunId::from_uuid(run_id),
        turn_number: turn_number as u32,
        action: serde_json::from_str(&action_json)
            .map_err(|e| RepoError::serialization(format!("turn action: {e}")))?,
        state_before: serde_json::from_str(&before_json)
            .map_err(|e| RepoError::serialization(format!("turn state before: {e}")))?,
        state_after: serde_json::from_str(&after_json)
            .map_err(|e| RepoError::serialization(format!("turn state after: {e}")))?,
        provider_payload: serde_json::from_str(&payload_json)
            .map_err(|e| RepoError::serialization(format!("turn payload: {e}")))?,
        latency_ms: latency_ms as u64,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::ports::RunRepo;
    use crate::infrastructure::sqlite::connection::memory_pool;
    use crate::infrastructure::sqlite::SqliteRunRepo;
    use chrono::Utc;
    use vigil_domain::{
        ActionType, ActorId, ActorKind, ChosenAction, RunConfig, RunState, RunStatus,
    };

    fn action() -> ChosenAction {
        ChosenAction {
            id: "c1".to_string(),
            text: "open the door".to_string(),
            action_type: ActionType::Move,
        }
    }

    fn record(run: &Run, turn_number: u32, before: RunState, after: RunState) -> TurnRecord {
        TurnRecord {
            run_id: run.id,
            turn_number,
            action: action(),
            state_before: before,
            state_after: after,
            provider_payload: serde_json::json!({"narrative": "..."}),
            latency_ms: 1200,
            created_at: Utc::now(),
        }
    }

    async fn seeded_run(pool: &SqlitePool) -> Run {
        let runs = SqliteRunRepo::new(pool.clone(), Arc::new(SystemClock::new()));
        let run = Run::new(
            ActorId::new("0xabc"),
            ActorKind::Human,
            RunConfig::default(),
            Utc::now(),
        );
        runs.create(&run).await.expect("create run");
        run
    }

    #[tokio::test]
    async fn commit_turn_writes_turn_and_run_atomically() {
        let pool = memory_pool().await;
        let mut run = seeded_run(&pool).await;
        let repo = SqliteTurnRepo::new(pool.clone(), Arc::new(SystemClock::new()));

        let before = RunState::initial(&run.config);
        let after = RunState {
            sanity: 80,
            ..before.clone()
        };
        run.current_turn = 1;
        repo.commit_turn(&run, &record(&run, 1, before, after.clone()))
            .await
            .expect("commit");

        let latest = repo
            .latest_for_run(run.id)
            .await
            .expect("latest")
            .expect("turn exists");
        assert_eq!(latest.turn_number, 1);
        assert_eq!(latest.state_after, after);

        let runs = SqliteRunRepo::new(pool, Arc::new(SystemClock::new()));
        let stored = runs.get(run.id).await.expect("get").expect("run exists");
        assert_eq!(stored.current_turn, 1);
    }

    #[tokio::test]
    async fn commit_turn_for_unknown_run_leaves_no_turn_row() {
        let pool = memory_pool().await;
        let repo = SqliteTurnRepo::new(pool.clone(), Arc::new(SystemClock::new()));

        let ghost = Run::new(
            ActorId::new("0xghost"),
            ActorKind::Human,
            RunConfig::default(),
            Utc::now(),
        );
        let before = RunState::initial(&ghost.config);
        let after = before.clone();
        let err = repo
            .commit_turn(&ghost, &record(&ghost, 1, before, after))
            .await
            .expect_err("unknown run");
        assert!(err.is_not_found());

        // The transaction rolled back - no orphan turn row.
        assert!(repo
            .latest_for_run(ghost.id)
            .await
            .expect("latest")
            .is_none());
    }

    #[tokio::test]
    async fn turns_list_in_number_order() {
        let pool = memory_pool().await;
        let mut run = seeded_run(&pool).await;
        let repo = SqliteTurnRepo::new(pool, Arc::new(SystemClock::new()));

        let mut state = RunState::initial(&run.config);
        for turn in 1..=3u32 {
            let next = RunState {
                sanity: state.sanity - 5,
                ..state.clone()
            };
            run.current_turn = turn;
            repo.commit_turn(&run, &record(&run, turn, state.clone(), next.clone()))
                .await
                .expect("commit");
            state = next;
        }

        let turns = repo.list_for_run(run.id).await.expect("list");
        let numbers: Vec<u32> = turns.iter().map(|t| t.turn_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        // Chained states: each before equals the previous after.
        for pair in turns.windows(2) {
            assert_eq!(pair[1].state_before, pair[0].state_after);
        }
    }

    #[tokio::test]
    async fn duplicate_turn_number_is_rejected() {
        let pool = memory_pool().await;
        let mut run = seeded_run(&pool).await;
        let repo = SqliteTurnRepo::new(pool, Arc::new(SystemClock::new()));

        let before = RunState::initial(&run.config);
        let after = before.clone();
        run.current_turn = 1;
        repo.commit_turn(&run, &record(&run, 1, before.clone(), after.clone()))
            .await
            .expect("first commit");

        // Primary key (run_id, turn_number) enforces append-only turns.
        assert!(repo
            .commit_turn(&run, &record(&run, 1, before, after))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn run_status_persists_with_terminal_turn() {
        let pool = memory_pool().await;
        let mut run = seeded_run(&pool).await;
        let repo = SqliteTurnRepo::new(pool.clone(), Arc::new(SystemClock::new()));

        let before = RunState::initial(&run.config);
        let after = RunState {
            sanity: 0,
            is_game_over: true,
            ..before.clone()
        };
        run.current_turn = 1;
        run.finish(RunStatus::Failed, Some(false), Utc::now())
            .expect("finish");
        repo.commit_turn(&run, &record(&run, 1, before, after))
            .await
            .expect("commit");

        let runs = SqliteRunRepo::new(pool, Arc::new(SystemClock::new()));
        let stored = runs.get(run.id).await.expect("get").expect("exists");
        assert_eq!(stored.status, RunStatus::Failed);
        assert_eq!(stored.victory, Some(false));
        assert!(stored.ended_at.is_some());
    }
}
