//! Run repository implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use vigil_domain::{ActorId, ActorKind, Run, RunId, RunStatus};

use crate::infrastructure::ports::{ClockPort, RepoError, RunRepo};

/// Repository for run rows.
pub struct SqliteRunRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteRunRepo {
    pub fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl RunRepo for SqliteRunRepo {
    async fn create(&self, run: &Run) -> Result<(), RepoError> {
        let config_json = serde_json::to_string(&run.config)
            .map_err(|e| RepoError::serialization(e))?;
        sqlx::query(
            r#"
            INSERT INTO runs (id, actor, actor_kind, status, current_turn,
                              started_at, ended_at, victory, config_json, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run.id.to_string())
        .bind(run.actor.as_str())
        .bind(run.actor_kind.to_string())
        .bind(run.status.to_string())
        .bind(i64::from(run.current_turn))
        .bind(run.started_at.to_rfc3339())
        .bind(run.ended_at.map(|t| t.to_rfc3339()))
        .bind(run.victory)
        .bind(config_json)
        .bind(self.clock.now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("create_run", e))?;

        tracing::debug!(run_id = %run.id, "Created run");
        Ok(())
    }

    async fn get(&self, id: RunId) -> Result<Option<Run>, RepoError> {
        let row = sqlx::query("SELECT * FROM runs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_run", e))?;

        row.map(|r| row_to_run(&r)).transpose()
    }

    async fn find_active_by_actor(&self, actor: &ActorId) -> Result<Option<Run>, RepoError> {
        let row = sqlx::query("SELECT * FROM runs WHERE actor = ? AND status = ? LIMIT 1")
            .bind(actor.as_str())
            .bind(RunStatus::Active.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("find_active_by_actor", e))?;

        row.map(|r| row_to_run(&r)).transpose()
    }

    async fn list(&self) -> Result<Vec<Run>, RepoError> {
        let rows = sqlx::query("SELECT * FROM runs ORDER BY started_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("list_runs", e))?;

        rows.iter().map(row_to_run).collect()
    }

    async fn update(&self, run: &Run) -> Result<(), RepoError> {
        let config_json = serde_json::to_string(&run.config)
            .map_err(|e| RepoError::serialization(e))?;
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
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("update_run", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Run", run.id));
        }
        Ok(())
    }
}

/// Convert a row into a run.
pub(super) fn row_to_run(row: &SqliteRow) -> Result<Run, RepoError> {
    let id_str: String = row.get("id");
    let actor: String = row.get("actor");
    let actor_kind: String = row.get("actor_kind");
    let status: String = row.get("status");
    let current_turn: i64 = row.get("current_turn");
    let started_at: String = row.get("started_at");
    let ended_at: Option<String> = row.get("ended_at");
    let victory: Option<bool> = row.get("victory");
    let config_json: String = row.get("config_json");

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| RepoError::serialization(format!("run id: {e}")))?;
    let status = RunStatus::from_str(&status)
        .map_err(|_| RepoError::serialization(format!("unknown run status: {status}")))?;
    let actor_kind = ActorKind::from_str(&actor_kind).unwrap_or(ActorKind::Human);
    let config = serde_json::from_str(&config_json)
        .map_err(|e| RepoError::serialization(format!("run config: {e}")))?;

    Ok(Run {
        id: RunId::from_uuid(id),
        actor: ActorId::new(actor),
        actor_kind,
        status,
        current_turn: current_turn as u32,
        started_at: parse_timestamp(&started_at)?,
        ended_at: ended_at.as_deref().map(parse_timestamp).transpose()?,
        victory,
        config,
    })
}

pub(super) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("timestamp: {e}")))
}
