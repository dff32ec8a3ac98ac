//! Board events - immutable, globally ordered milestones fed to observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ActorKind, Run};
use crate::ids::RunId;
use crate::value_objects::RunState;

/// Turn numbers that always warrant a dedicated board event.
pub const MILESTONE_TURNS: [u32; 8] = [1, 3, 5, 8, 10, 12, 15, 20];

/// Crossing at or below this sanity fires a single critical event.
pub const SANITY_CRITICAL_THRESHOLD: i32 = 30;

/// Kind of a board event; doubles as the frame tag on the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardEventKind {
    RunStarted,
    TurnMilestone,
    ItemAcquired,
    SanityCritical,
    Victory,
    Death,
}

impl std::fmt::Display for BoardEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RunStarted => write!(f, "run_started"),
            Self::TurnMilestone => write!(f, "turn_milestone"),
            Self::ItemAcquired => write!(f, "item_acquired"),
            Self::SanityCritical => write!(f, "sanity_critical"),
            Self::Victory => write!(f, "victory"),
            Self::Death => write!(f, "death"),
        }
    }
}

/// One notable state change, before the log assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEvent {
    pub kind: BoardEventKind,
    pub run_id: RunId,
    pub actor_kind: ActorKind,
    pub actor_mask: String,
    pub turn: u32,
    pub sanity: i32,
    pub location: String,
    pub message: String,
    #[serde(default)]
    pub item_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A board event after the log assigned its globally ordered id.
///
/// Ids are strictly increasing within the log and serve as the only valid
/// resumption cursor; `created_at` is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    #[serde(flatten)]
    pub event: BoardEvent,
}

/// The one-time event announcing a freshly created run.
pub fn run_started_event(run: &Run, state: &RunState, now: DateTime<Utc>) -> BoardEvent {
    BoardEvent {
        kind: BoardEventKind::RunStarted,
        run_id: run.id,
        actor_kind: run.actor_kind,
        actor_mask: run.actor.masked(),
        turn: 0,
        sanity: state.sanity,
        location: state.location.clone(),
        message: format!("{} stepped inside", run.actor.masked()),
        item_name: None,
        created_at: now,
    }
}

/// Derive the board events for one committed transition.
///
/// Ordering is deterministic: milestone, then item acquisitions in inventory
/// order, then sanity-critical, then the terminal event. Sanity-critical is
/// edge-triggered - it fires only on the turn where sanity crosses from
/// above the threshold to at or below it.
pub fn derive_turn_events(
    run: &Run,
    before: &RunState,
    after: &RunState,
    turn: u32,
    now: DateTime<Utc>,
) -> Vec<BoardEvent> {
    let base = |kind: BoardEventKind, message: String, item_name: Option<String>| BoardEvent {
        kind,
        run_id: run.id,
        actor_kind: run.actor_kind,
        actor_mask: run.actor.masked(),
        turn,
        sanity: after.sanity,
        location: after.location.clone(),
        message,
        item_name,
        created_at: now,
    };

    let mut events = Vec::new();

    if MILESTONE_TURNS.contains(&turn) {
        events.push(base(
            BoardEventKind::TurnMilestone,
            format!("survived to turn {turn}"),
            None,
        ));
    }

    // Multiset diff by id: a turn can consume one item and acquire another,
    // so a plain length comparison would miss the pickup.
    let mut carried: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for item in &before.inventory {
        *carried.entry(item.id.as_str()).or_insert(0) += 1;
    }
    for item in &after.inventory {
        let count = carried.entry(item.id.as_str()).or_insert(0);
        if *count > 0 {
            *count -= 1;
        } else {
            events.push(base(
                BoardEventKind::ItemAcquired,
                format!("found {}", item.name),
                Some(item.name.clone()),
            ));
        }
    }

    if before.sanity > SANITY_CRITICAL_THRESHOLD && after.sanity <= SANITY_CRITICAL_THRESHOLD {
        events.push(base(
            BoardEventKind::SanityCritical,
            format!("sanity down to {}", after.sanity),
            None,
        ));
    }

    if after.is_game_over && !before.is_game_over {
        if after.is_victory {
            events.push(base(
                BoardEventKind::Victory,
                format!("escaped after {turn} turns"),
                None,
            ));
        } else {
            events.push(base(
                BoardEventKind::Death,
                format!("lost on turn {turn}"),
                None,
            ));
        }
    }

    events
}
