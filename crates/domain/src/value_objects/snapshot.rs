//! Denormalized latest-known projection of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ActorKind, Run, RunStatus};
use crate::ids::RunId;
use crate::value_objects::RunState;

/// What observers see for one run on the board.
///
/// Rebuildable from the persistent store at any time; never itself a source
/// of truth. Concurrent writers resolve by last-write-wins on `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub actor_kind: ActorKind,
    /// Masked actor identity - full ids never reach the board.
    pub actor_mask: String,
    pub status: RunStatus,
    pub turn: u32,
    pub sanity: i32,
    pub location: String,
    pub victory: Option<bool>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RunSnapshot {
    /// Project a run and its latest state into board form.
    pub fn project(run: &Run, state: &RunState, updated_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run.id,
            actor_kind: run.actor_kind,
            actor_mask: run.actor.masked(),
            status: run.status,
            turn: run.current_turn,
            sanity: state.sanity,
            location: state.location.clone(),
            victory: run.victory,
            started_at: run.started_at,
            ended_at: run.ended_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ActorId;
    use crate::value_objects::RunConfig;

    #[test]
    fn project_masks_the_actor() {
        let run = Run::new(
            ActorId::new("0x1234567890abcdef1234567890abcdef12345678"),
            ActorKind::Human,
            RunConfig::default(),
            Utc::now(),
        );
        let state = RunState::initial(&run.config);
        let snapshot = RunSnapshot::project(&run, &state, Utc::now());
        assert_eq!(snapshot.actor_mask, "0x1234…5678");
        assert_eq!(snapshot.turn, 0);
        assert_eq!(snapshot.sanity, 100);
    }
}
