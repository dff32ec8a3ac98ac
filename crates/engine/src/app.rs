//! Application state and composition.

use std::sync::Arc;

use vigil_domain::RunConfig;

use crate::infrastructure::board::BoardPort;
use crate::infrastructure::ports::{ClockPort, NarrativePort, RunRepo, TurnRepo};
use crate::use_cases::{
    board::{BoardQuery, BoardUseCases, EventEmitter, Reconciler},
    run::{AbandonRun, GetRun, RunUseCases, StartRun, SubmitTurn},
};

/// Main application state.
///
/// Holds all use cases plus the board port for the stream gateway. Passed to
/// HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
    pub board: Arc<dyn BoardPort>,
}

/// Container for all use cases.
pub struct UseCases {
    pub run: RunUseCases,
    pub board: BoardUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        runs: Arc<dyn RunRepo>,
        turns: Arc<dyn TurnRepo>,
        narrative: Arc<dyn NarrativePort>,
        board: Arc<dyn BoardPort>,
        clock: Arc<dyn ClockPort>,
        game_config: RunConfig,
    ) -> Self {
        let emitter = Arc::new(EventEmitter::new(board.clone(), clock.clone()));
        let reconciler = Arc::new(Reconciler::new(runs.clone(), turns.clone(), board.clone()));
        let query = Arc::new(BoardQuery::new(board.clone(), reconciler.clone()));

        let run_use_cases = RunUseCases {
            start: Arc::new(StartRun::new(
                runs.clone(),
                turns.clone(),
                emitter.clone(),
                clock.clone(),
                game_config.clone(),
            )),
            submit_turn: Arc::new(SubmitTurn::new(
                runs.clone(),
                turns.clone(),
                narrative,
                emitter.clone(),
                clock.clone(),
                game_config,
            )),
            get: Arc::new(GetRun::new(runs.clone(), turns.clone())),
            abandon: Arc::new(AbandonRun::new(runs, turns, emitter.clone(), clock)),
        };

        let board_use_cases = BoardUseCases {
            emitter,
            query,
            reconciler,
        };

        Self {
            use_cases: UseCases {
                run: run_use_cases,
                board: board_use_cases,
            },
            board,
        }
    }
}
