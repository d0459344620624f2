//! Agentic RAG Core Library
//!
//! This crate provides the foundational utilities shared by every other crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{
    AppConfig, EmbeddingSettings, ProviderConfig, RagSettings, SearchSettings, ServerSettings,
    SessionSettings,
};
pub use error::{AppError, AppResult};
