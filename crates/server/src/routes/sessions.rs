use crate::error::ApiError;
use crate::models::{
    CreateSessionRequest, HistoryMessage, HistoryParams, HistoryResponse, SessionResponse,
    DEFAULT_HISTORY_LIMIT,
};
use crate::state::AppState;
use agentic_session::store::DEFAULT_LIST_LIMIT;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let user_id = request
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let session = state.sessions.create_session(user_id)?;
    tracing::info!("Created session {}", session.thread_id);
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Active sessions, most recently updated first.
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let sessions = state
        .sessions
        .list_sessions(DEFAULT_LIST_LIMIT)?
        .into_iter()
        .map(SessionResponse::from)
        .collect();

    Ok(Json(sessions))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .sessions
        .get_session(&thread_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Session '{}' not found", thread_id)))?;
    Ok(Json(session.into()))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    if state.sessions.get_session(&thread_id)?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Session '{}' not found",
            thread_id
        )));
    }

    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let messages: Vec<HistoryMessage> = state
        .sessions
        .history(&thread_id, limit)?
        .into_iter()
        .map(HistoryMessage::from)
        .collect();

    Ok(Json(HistoryResponse {
        thread_id,
        message_count: messages.len(),
        messages,
    }))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.delete_session(&thread_id)? {
        return Err(ApiError::NotFound(format!(
            "Session '{}' not found",
            thread_id
        )));
    }

    tracing::info!("Deleted session {}", thread_id);
    Ok(StatusCode::NO_CONTENT)
}
