//! SQLite-backed persistent store.

pub(crate) mod connection;
mod run_repo;
mod turn_repo;

pub use connection::{connect, ensure_schema};
pub use run_repo::SqliteRunRepo;
pub use turn_repo::SqliteTurnRepo;
