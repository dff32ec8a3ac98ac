pub mod manage;
pub mod start;
pub mod submit_turn;

pub use manage::{AbandonRun, GetRun, ManageError};
pub use start::{StartRun, StartRunError, StartedRun};
pub use submit_turn::{SubmitTurn, TurnError};

use std::sync::Arc;

/// Container for the run-side use cases.
pub struct RunUseCases {
    pub start: Arc<StartRun>,
    pub submit_turn: Arc<SubmitTurn>,
    pub get: Arc<GetRun>,
    pub abandon: Arc<AbandonRun>,
}
