//! Domain error types.

use thiserror::Error;

use crate::entities::RunStatus;

/// Errors raised by domain invariants.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// A status transition that would move a terminal run backwards.
    #[error("invalid status transition {from} -> {to}")]
    InvalidStatusTransition { from: RunStatus, to: RunStatus },
}
