extern crate self as vigil_domain;

pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod transition;
pub mod value_objects;

pub use entities::{
    ActionType, ActorKind, Choice, ChosenAction, EvidenceItem, ItemKind, Run, RunStatus,
    TurnRecord,
};
pub use error::DomainError;
pub use events::{
    derive_turn_events, run_started_event, BoardEvent, BoardEventKind, EventRecord,
    MILESTONE_TURNS, SANITY_CRITICAL_THRESHOLD,
};
pub use ids::{ActorId, RunId};
pub use transition::{apply_delta, BULK_DISCOVERY_MARKERS};
pub use value_objects::{NarrativeDelta, RunConfig, RunState, RunSnapshot};
