//! Live event stream - the per-connection observer gateway.
//!
//! Server-sent events over one long-lived response. Each board event rides
//! as one frame: the frame id is the event's log id (the client's resumption
//! cursor) and the frame tag is the event kind. The transport drops the
//! whole stream future on disconnect, which tears down the poll loop and
//! heartbeat within one poll interval.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use serde::Deserialize;

use vigil_domain::EventRecord;
use vigil_shared::{BoardEventDto, ReadyFrame, STREAM_EVENT_READY};

use crate::app::App;
use crate::infrastructure::board::BoardPort;

use super::http::ApiError;

/// Events fetched per log read.
const STREAM_BATCH_SIZE: usize = 100;

/// Idle backoff between log polls when no notification arrives.
const POLL_BACKOFF: Duration = Duration::from_millis(500);

/// Keep-alive interval so intermediaries do not time out idle connections.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Reconnect delay advertised to clients in the ready frame.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    /// Last event id the client has seen.
    pub cursor: Option<i64>,
    /// `full` requests a replay of the whole retained log.
    pub replay: Option<String>,
}

pub async fn stream(
    State(app): State<Arc<App>>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let board = app.board.clone();

    // Fail fast instead of hanging; clients fall back to /api/board polling.
    if !board.is_available() {
        return Err(ApiError::StreamUnavailable);
    }

    let cursor = match resolve_cursor(&params, &headers) {
        ResolvedCursor::Explicit(cursor) => cursor,
        ResolvedCursor::FullReplay => 0,
        ResolvedCursor::Latest => board.latest_cursor().await,
    };

    tracing::debug!(cursor, "Observer connected to stream");

    let ready = ready_frame(cursor);
    let state = StreamState {
        board,
        cursor,
        pending: VecDeque::new(),
        ready: Some(ready),
    };

    let stream = futures_util::stream::unfold(state, |mut state| async move {
        if let Some(ready) = state.ready.take() {
            return Some((Ok(ready), state));
        }

        loop {
            if let Some(record) = state.pending.pop_front() {
                state.cursor = record.id;
                return Some((Ok(event_frame(&record)), state));
            }

            let batch = state
                .board
                .events_after(state.cursor, STREAM_BATCH_SIZE)
                .await;
            if batch.is_empty() {
                // Wait for a wakeup, or re-poll after the fixed backoff.
                tokio::select! {
                    _ = state.board.wait_for_events() => {}
                    _ = tokio::time::sleep(POLL_BACKOFF) => {}
                }
                continue;
            }
            state.pending.extend(batch);
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    ))
}

struct StreamState {
    board: Arc<dyn BoardPort>,
    cursor: i64,
    pending: VecDeque<EventRecord>,
    ready: Option<Event>,
}

enum ResolvedCursor {
    /// Resume strictly after this id.
    Explicit(i64),
    /// Replay everything still retained.
    FullReplay,
    /// New connection: only future events.
    Latest,
}

fn resolve_cursor(params: &StreamParams, headers: &HeaderMap) -> ResolvedCursor {
    if let Some(cursor) = params.cursor {
        return ResolvedCursor::Explicit(cursor);
    }
    // SSE auto-reconnect resends the last frame id as a header.
    if let Some(cursor) = headers
        .get("last-event-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
    {
        return ResolvedCursor::Explicit(cursor);
    }
    if params.replay.as_deref() == Some("full") {
        return ResolvedCursor::FullReplay;
    }
    ResolvedCursor::Latest
}

fn ready_frame(cursor: i64) -> Event {
    let frame = ReadyFrame {
        server_time: chrono::Utc::now().to_rfc3339(),
        cursor,
    };
    let event = Event::default()
        .event(STREAM_EVENT_READY)
        .retry(RECONNECT_DELAY);
    match event.json_data(&frame) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode ready frame");
            Event::default().event(STREAM_EVENT_READY).data("{}")
        }
    }
}

fn event_frame(record: &EventRecord) -> Event {
    let event = Event::default()
        .id(record.id.to_string())
        .event(record.event.kind.to_string());
    match event.json_data(BoardEventDto::from(record)) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(id = record.id, error = %e, "Failed to encode event frame");
            Event::default()
                .id(record.id.to_string())
                .event(record.event.kind.to_string())
                .data("{}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn params(cursor: Option<i64>, replay: Option<&str>) -> StreamParams {
        StreamParams {
            cursor,
            replay: replay.map(str::to_string),
        }
    }

    #[test]
    fn explicit_cursor_param_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("last-event-id", HeaderValue::from_static("7"));
        let resolved = resolve_cursor(&params(Some(42), None), &headers);
        assert!(matches!(resolved, ResolvedCursor::Explicit(42)));
    }

    #[test]
    fn header_cursor_used_when_param_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("last-event-id", HeaderValue::from_static("7"));
        let resolved = resolve_cursor(&params(None, None), &headers);
        assert!(matches!(resolved, ResolvedCursor::Explicit(7)));
    }

    #[test]
    fn garbage_header_falls_through_to_latest() {
        let mut headers = HeaderMap::new();
        headers.insert("last-event-id", HeaderValue::from_static("not-a-number"));
        let resolved = resolve_cursor(&params(None, None), &headers);
        assert!(matches!(resolved, ResolvedCursor::Latest));
    }

    #[test]
    fn full_replay_requested_explicitly() {
        let resolved = resolve_cursor(&params(None, Some("full")), &HeaderMap::new());
        assert!(matches!(resolved, ResolvedCursor::FullReplay));
    }

    #[test]
    fn fresh_connection_resumes_from_latest() {
        let resolved = resolve_cursor(&params(None, None), &HeaderMap::new());
        assert!(matches!(resolved, ResolvedCursor::Latest));
    }
}
