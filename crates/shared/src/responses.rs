//! Response DTOs for the REST surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigil_domain::{
    ActorKind, BoardEvent, EventRecord, Run, RunSnapshot, RunState, RunStatus, TurnRecord,
};

/// A run plus its current state, returned by start/get.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub turn: u32,
    pub resumed: bool,
    pub state: RunState,
}

impl RunResponse {
    pub fn from_parts(run: &Run, state: RunState, resumed: bool) -> Self {
        Self {
            run_id: run.id.to_uuid(),
            status: run.status,
            turn: run.current_turn,
            resumed,
            state,
        }
    }
}

/// An accepted turn, returned by turn submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub run_id: Uuid,
    pub turn_number: u32,
    pub state: RunState,
    pub latency_ms: u64,
}

impl From<&TurnRecord> for TurnResponse {
    fn from(record: &TurnRecord) -> Self {
        Self {
            run_id: record.run_id.to_uuid(),
            turn_number: record.turn_number,
            state: record.state_after.clone(),
            latency_ms: record.latency_ms,
        }
    }
}

/// One run as observers see it on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshotDto {
    pub run_id: Uuid,
    pub actor_kind: ActorKind,
    pub actor: String,
    pub status: RunStatus,
    pub turn: u32,
    pub sanity: i32,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victory: Option<bool>,
}

impl From<&RunSnapshot> for RunSnapshotDto {
    fn from(snapshot: &RunSnapshot) -> Self {
        Self {
            run_id: snapshot.run_id.to_uuid(),
            actor_kind: snapshot.actor_kind,
            actor: snapshot.actor_mask.clone(),
            status: snapshot.status,
            turn: snapshot.turn,
            sanity: snapshot.sanity,
            location: snapshot.location.clone(),
            victory: snapshot.victory,
        }
    }
}

/// One board event on the wire, id included so pollers can advance a cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardEventDto {
    pub id: i64,
    #[serde(flatten)]
    pub event: BoardEvent,
}

impl From<&EventRecord> for BoardEventDto {
    fn from(record: &EventRecord) -> Self {
        Self {
            id: record.id,
            event: record.event.clone(),
        }
    }
}

/// Full poll fallback: active runs, recent completions, trailing events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshotResponse {
    pub active: Vec<RunSnapshotDto>,
    pub completed: Vec<RunSnapshotDto>,
    pub events: Vec<BoardEventDto>,
}

/// Error body for all REST failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    /// Whether the caller should retry the same request.
    #[serde(default)]
    pub retryable: bool,
}
