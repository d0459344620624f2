use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Agentic RAG API",
        "version": VERSION,
        "status": "running",
        "docs": "/api/v1",
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database_ok = state.sessions.health_check();

    Json(json!({
        "status": if database_ok { "healthy" } else { "degraded" },
        "database": if database_ok { "connected" } else { "disconnected" },
        "version": VERSION,
    }))
}
