//! HTTP API for the agentic RAG workflow.
//!
//! Routes live under `/api/v1`; `/` and `/health` are open, everything else
//! passes the API key check in [`security`].

pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use agentic_core::{AppConfig, AppError, AppResult};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/query", post(routes::query::process_query))
        .route("/query/health", get(routes::query::query_health))
        .route(
            "/sessions",
            get(routes::sessions::list_sessions).post(routes::sessions::create_session),
        )
        .route(
            "/sessions/:thread_id",
            get(routes::sessions::get_session).delete(routes::sessions::delete_session),
        )
        .route(
            "/sessions/:thread_id/history",
            get(routes::sessions::get_history),
        )
        .route("/documents/index", post(routes::documents::index_documents))
        .route("/documents/upload", post(routes::documents::upload_document))
        .route("/documents/health", get(routes::documents::documents_health))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            security::require_api_key,
        ));

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Open every component described by `config` and serve until ctrl-c.
pub async fn serve(config: AppConfig) -> AppResult<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::from_config(config)?);

    if state.config.server.api_keys.is_empty() {
        tracing::warn!("No API keys configured; accepting all requests (development mode)");
    }

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", bind_addr, e)))?;
    tracing::info!("Agentic RAG API listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Other(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
