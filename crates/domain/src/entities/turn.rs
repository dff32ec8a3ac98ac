//! Turn records - the append-only history of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RunId;
use crate::value_objects::RunState;

/// One accepted (action -> resulting state) step within a run.
///
/// Identified by (run id, turn number). Created exactly once per accepted
/// player action and never mutated or deleted. Turn numbers form a
/// contiguous sequence starting at 1, and `state_before` equals the previous
/// turn's `state_after` (or the initial state for turn 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub run_id: RunId,
    pub turn_number: u32,
    pub action: ChosenAction,
    pub state_before: RunState,
    pub state_after: RunState,
    /// The provider's raw payload, kept verbatim for auditing.
    pub provider_payload: serde_json::Value,
    /// Wall time spent waiting on the narrative provider.
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// The action the player picked for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenAction {
    pub id: String,
    pub text: String,
    pub action_type: ActionType,
}

/// A choice offered to the player by the narrative provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub action_type: ActionType,
}

/// Fixed set of action categories the narrative understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Move,
    Investigate,
    UseItem,
    Talk,
    Wait,
    /// Unknown type for forward compatibility
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Investigate => write!(f, "investigate"),
            Self::UseItem => write!(f, "use_item"),
            Self::Talk => write!(f, "talk"),
            Self::Wait => write!(f, "wait"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
