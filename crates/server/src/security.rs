//! API key check.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Accept the request when its `X-API-Key` is one of `allowed`. An empty
/// list accepts everything.
pub fn check_api_key(headers: &HeaderMap, allowed: &[String]) -> Result<(), ApiError> {
    if allowed.is_empty() {
        return Ok(());
    }

    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() || !allowed.iter().any(|key| key == provided) {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_api_key(request.headers(), &state.config.server.api_keys)?;
    Ok(next.run(request).await)
}
