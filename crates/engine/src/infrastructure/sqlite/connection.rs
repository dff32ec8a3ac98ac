//! SQLite connection management.

use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

/// Open (or create) the database at `db_path`.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let pool = SqlitePool::connect(&format!("sqlite:{db_path}?mode=rwc"))
        .await
        .map_err(|e| RepoError::database("connect", e))?;
    ensure_schema(&pool).await?;
    tracing::info!("Connected to SQLite at {}", db_path);
    Ok(pool)
}

/// Create tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            id TEXT PRIMARY KEY,
            actor TEXT NOT NULL,
            actor_kind TEXT NOT NULL,
            status TEXT NOT NULL,
            current_turn INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            victory INTEGER,
            config_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| RepoError::database("ensure_schema", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS turns (
            run_id TEXT NOT NULL,
            turn_number INTEGER NOT NULL,
            action_json TEXT NOT NULL,
            state_before_json TEXT NOT NULL,
            state_after_json TEXT NOT NULL,
            provider_payload_json TEXT NOT NULL,
            latency_ms INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (run_id, turn_number)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| RepoError::database("ensure_schema", e))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS runs_actor_status ON runs (actor, status)")
        .execute(pool)
        .await
        .map_err(|e| RepoError::database("ensure_schema", e))?;

    Ok(())
}

/// In-memory pool for tests.
///
/// Capped at one connection: each pooled connection to `sqlite::memory:`
/// would otherwise open its own private database.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    ensure_schema(&pool).await.expect("schema");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_creates_database_file_with_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vigil-test.db");
        let pool = connect(path.to_str().expect("utf8 path"))
            .await
            .expect("connect");

        sqlx::query(
            "INSERT INTO runs (id, actor, actor_kind, status, current_turn, \
             started_at, config_json, updated_at) \
             VALUES ('r1', 'a', 'human', 'active', 0, \
             '2026-01-01T00:00:00Z', '{}', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .expect("schema accepts writes");

        assert!(path.exists());
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let pool = memory_pool().await;
        ensure_schema(&pool).await.expect("second pass");
    }
}
