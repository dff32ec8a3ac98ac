//! Vigil Protocol - Shared types for engine and observer/player clients.
//!
//! This crate contains the wire-format DTOs for the REST surface and the
//! live event stream.
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, uuid
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` in DTOs

pub mod requests;
pub mod responses;
pub mod stream;

pub use requests::{StartRunRequest, SubmitTurnRequest};
pub use responses::{
    BoardEventDto, BoardSnapshotResponse, ErrorBody, RunResponse, RunSnapshotDto, TurnResponse,
};
pub use stream::{ReadyFrame, STREAM_EVENT_READY};
