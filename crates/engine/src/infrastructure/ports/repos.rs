//! Repository port traits for the persistent store.

use async_trait::async_trait;

use vigil_domain::{ActorId, Run, RunId, TurnRecord};

use super::error::RepoError;

/// Durable storage for runs. System of record.
#[async_trait]
pub trait RunRepo: Send + Sync {
    async fn create(&self, run: &Run) -> Result<(), RepoError>;

    async fn get(&self, id: RunId) -> Result<Option<Run>, RepoError>;

    /// The actor's currently active run, if any. At most one exists.
    async fn find_active_by_actor(&self, actor: &ActorId) -> Result<Option<Run>, RepoError>;

    /// All runs, newest first. Used by the reconciler.
    async fn list(&self) -> Result<Vec<Run>, RepoError>;

    /// Persist run mutations outside the turn commit (e.g. abandon).
    async fn update(&self, run: &Run) -> Result<(), RepoError>;
}

/// Durable storage for turn records.
#[async_trait]
pub trait TurnRepo: Send + Sync {
    /// The latest turn of a run, if any turn was accepted yet.
    async fn latest_for_run(&self, run_id: RunId) -> Result<Option<TurnRecord>, RepoError>;

    /// All turns of a run in turn-number order.
    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<TurnRecord>, RepoError>;

    /// Commit one accepted turn atomically: insert the turn record and apply
    /// the run mutations (turn counter, config snapshot, terminal fields) in
    /// a single transaction. Either both land or neither does.
    async fn commit_turn(&self, run: &Run, record: &TurnRecord) -> Result<(), RepoError>;
}
