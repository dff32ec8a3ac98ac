//! Application use cases.

pub mod board;
pub mod run;

pub use board::{BoardQuery, BoardUseCases, BoardView, EventEmitter, Reconciler};
pub use run::{
    AbandonRun, GetRun, ManageError, RunUseCases, StartRun, StartRunError, StartedRun, SubmitTurn,
    TurnError,
};
