pub mod emitter;
pub mod query;
pub mod reconcile;

pub use emitter::EventEmitter;
pub use query::{BoardQuery, BoardView};
pub use reconcile::Reconciler;

use std::sync::Arc;

/// Container for the board-side use cases.
pub struct BoardUseCases {
    pub emitter: Arc<EventEmitter>,
    pub query: Arc<BoardQuery>,
    pub reconciler: Arc<Reconciler>,
}
