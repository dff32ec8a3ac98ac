//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use vigil_domain::{ActorId, ChosenAction, RunId};
use vigil_shared::{
    BoardEventDto, BoardSnapshotResponse, ErrorBody, RunResponse, RunSnapshotDto,
    StartRunRequest, SubmitTurnRequest, TurnResponse,
};

use crate::app::App;
use crate::use_cases::{ManageError, TurnError};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/runs", post(start_run))
        .route("/api/runs/{id}", get(get_run))
        .route("/api/runs/{id}/turns", post(submit_turn))
        .route("/api/runs/{id}/abandon", post(abandon_run))
        .route("/api/board", get(board_snapshot))
        .route("/api/stream", get(super::stream::stream))
}

async fn health() -> &'static str {
    "OK"
}

async fn start_run(
    State(app): State<Arc<App>>,
    Json(request): Json<StartRunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    if request.actor.trim().is_empty() {
        return Err(ApiError::BadRequest("actor must not be empty".to_string()));
    }

    let started = app
        .use_cases
        .run
        .start
        .execute(ActorId::new(request.actor), request.actor_kind)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(RunResponse::from_parts(
        &started.run,
        started.state,
        started.resumed,
    )))
}

async fn get_run(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>, ApiError> {
    let (run, state) = app
        .use_cases
        .run
        .get
        .execute(RunId::from_uuid(id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(RunResponse::from_parts(&run, state, false)))
}

async fn submit_turn(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitTurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let action = ChosenAction {
        id: request.choice_id,
        text: request.choice_text,
        action_type: request.action_type,
    };

    let record = app
        .use_cases
        .run
        .submit_turn
        .execute(RunId::from_uuid(id), action)
        .await?;

    Ok(Json(TurnResponse::from(&record)))
}

async fn abandon_run(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = app
        .use_cases
        .run
        .abandon
        .execute(RunId::from_uuid(id))
        .await?;

    let state = app
        .use_cases
        .run
        .get
        .execute(run.id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map(|(_, state)| state)
        .ok_or(ApiError::NotFound)?;

    Ok(Json(RunResponse::from_parts(&run, state, false)))
}

async fn board_snapshot(
    State(app): State<Arc<App>>,
) -> Result<Json<BoardSnapshotResponse>, ApiError> {
    let view = app
        .use_cases
        .board
        .query
        .execute()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(BoardSnapshotResponse {
        active: view.active.iter().map(RunSnapshotDto::from).collect(),
        completed: view.completed.iter().map(RunSnapshotDto::from).collect(),
        events: view.events.iter().map(BoardEventDto::from).collect(),
    }))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    /// Submission against a run that cannot accept it; no retry implied.
    Conflict(String),
    /// Provider failure; the caller should retry the same turn.
    ProviderUnavailable(String),
    /// The live stream cannot be served; clients fall back to polling.
    StreamUnavailable,
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, error, message, retryable) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_string(), false),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, false),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, false),
            ApiError::ProviderUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, "provider_unavailable", msg, true)
            }
            ApiError::StreamUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "stream_unavailable",
                "Live stream unavailable, fall back to polling".to_string(),
                false,
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal error".to_string(),
                    false,
                )
            }
        };

        (
            status,
            axum::Json(ErrorBody {
                error: error.to_string(),
                message,
                retryable,
            }),
        )
            .into_response()
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        match &e {
            TurnError::RunNotFound(_) => ApiError::NotFound,
            TurnError::NotEligible { .. } | TurnError::AlreadyOver(_) => {
                ApiError::Conflict(e.to_string())
            }
            TurnError::Provider(_) => ApiError::ProviderUnavailable(e.to_string()),
            TurnError::Repo(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<ManageError> for ApiError {
    fn from(e: ManageError) -> Self {
        match &e {
            ManageError::RunNotFound(_) => ApiError::NotFound,
            ManageError::NotEligible { .. } => ApiError::Conflict(e.to_string()),
            ManageError::Repo(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<crate::infrastructure::ports::RepoError> for ApiError {
    fn from(e: crate::infrastructure::ports::RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
