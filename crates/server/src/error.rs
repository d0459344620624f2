//! API error responses.

use agentic_core::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("service unavailable: {0}")]
    Config(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Config(msg) => Self::Config(msg),
            AppError::Validation(msg) => Self::Validation(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Config(msg)
            | Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::Unauthorized => "Invalid or missing API key".to_string(),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
            "type": self.kind(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let config: ApiError = AppError::Config("no model".to_string()).into();
        assert_eq!(config.status(), StatusCode::SERVICE_UNAVAILABLE);

        let validation: ApiError = AppError::Validation("bad".to_string()).into();
        assert_eq!(validation.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let other: ApiError = AppError::Database("locked".to_string()).into();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(other.to_string().contains("locked"));
    }
}
