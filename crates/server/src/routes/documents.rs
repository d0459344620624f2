use crate::error::ApiError;
use crate::models::{IndexResponse, UploadRequest, UploadResponse};
use crate::state::AppState;
use agentic_core::AppError;
use agentic_knowledge::{IndexOptions, KnowledgeBase};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

fn knowledge(state: &AppState) -> Result<&Arc<KnowledgeBase>, ApiError> {
    state
        .knowledge
        .as_ref()
        .ok_or_else(|| ApiError::Config("Knowledge base is not initialized".to_string()))
}

/// Index new and modified files in the documents directory.
pub async fn index_documents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IndexResponse>, ApiError> {
    tracing::info!("Starting document indexing...");
    let stats = knowledge(&state)?
        .index_documents(IndexOptions::default())
        .await?;
    tracing::info!("Document indexing completed");

    Ok(Json(IndexResponse {
        status: "success".to_string(),
        message: format!(
            "Indexed {} of {} files ({} chunks added)",
            stats.files_indexed, stats.files_seen, stats.chunks_added
        ),
        stats,
    }))
}

/// Save an uploaded document and index it. Invalid uploads are reported in
/// the body rather than as an error status.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let knowledge = knowledge(&state)?;

    if let Some(metadata) = &request.metadata {
        tracing::debug!("Upload metadata for {}: {}", request.filename, metadata);
    }

    let response = match knowledge
        .add_document(&request.filename, &request.content)
        .await
    {
        Ok(added) => UploadResponse {
            success: true,
            filename: added.filename,
            document_id: Some(added.document_id),
            message: format!("Document uploaded and indexed ({} chunks)", added.chunks),
        },
        Err(AppError::Validation(message)) => UploadResponse {
            success: false,
            filename: request.filename,
            document_id: None,
            message,
        },
        Err(e) => return Err(e.into()),
    };

    Ok(Json(response))
}

pub async fn documents_health() -> impl IntoResponse {
    Json(json!({"status": "healthy", "service": "documents"}))
}
