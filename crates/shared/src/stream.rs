//! Live stream frame payloads.
//!
//! Board events ride the stream as one frame each: the frame id is the
//! event's log id (the resumption cursor) and the frame tag is the event
//! kind. The only other frames are `ready` (once, on connect) and periodic
//! keep-alive comments.

use serde::{Deserialize, Serialize};

/// Frame tag of the initial ready frame.
pub const STREAM_EVENT_READY: &str = "ready";

/// First frame on every stream connection.
///
/// Carries the cursor the server resolved for this connection so the client
/// can persist it and resume from the same position after a disconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyFrame {
    pub server_time: String,
    pub cursor: i64,
}
