//! Error types for the Agentic RAG system.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, LLM, prompts, indexing, retrieval,
//! session storage and the workflow itself.

use thiserror::Error;

/// Unified error type for the Agentic RAG system.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Indexing and vector store errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Retrieval source errors (vector store, tools, web search)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Session store errors
    #[error("Database error: {0}")]
    Database(String),

    /// Workflow orchestration errors
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Invalid user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
