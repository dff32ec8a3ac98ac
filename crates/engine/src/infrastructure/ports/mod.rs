//! Port traits and their error types.
//!
//! Use cases depend on these traits only; concrete adapters live in the
//! sibling infrastructure modules.

mod error;
mod external;
mod repos;
mod testing;

pub use error::{ProviderError, RepoError};
pub use external::{NarrativeOutcome, NarrativePort, NarrativeRequest, TurnDigestEntry};
pub use repos::{RunRepo, TurnRepo};
pub use testing::ClockPort;
