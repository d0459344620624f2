use crate::error::ApiError;
use crate::models::{QueryRequest, QueryResponse, MAX_QUERY_CHARS};
use crate::state::AppState;
use agentic_llm::ChatRole;
use agentic_session::resolve_thread_id;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Run one query through the workflow inside a conversation thread.
pub async fn process_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let query = request.query.trim();
    let length = query.chars().count();
    if length == 0 || length > MAX_QUERY_CHARS {
        return Err(ApiError::Validation(format!(
            "Query must be between 1 and {} characters",
            MAX_QUERY_CHARS
        )));
    }

    let thread_id = resolve_thread_id(request.thread_id.as_deref(), request.user_id.as_deref());
    tracing::info!("Processing query (thread: {})", thread_id);

    state
        .sessions
        .ensure_session(&thread_id, request.user_id.as_deref())?;
    let history = state.sessions.context_messages(&thread_id)?;

    let result = state.workflow.run(query, history).await;

    if let Some(error) = &result.error {
        tracing::warn!("Query failed, thread {} left unchanged: {}", thread_id, error);
    } else {
        state
            .sessions
            .append_message(&thread_id, ChatRole::User, query)?;
        state
            .sessions
            .append_message(&thread_id, ChatRole::Assistant, &result.answer)?;
    }
    let message_count = state.sessions.message_count(&thread_id)?;

    Ok(Json(QueryResponse::from_state(
        result,
        thread_id,
        message_count,
    )))
}

pub async fn query_health() -> impl IntoResponse {
    Json(json!({"status": "healthy", "service": "query"}))
}
