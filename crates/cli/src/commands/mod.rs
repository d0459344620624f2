//! Command handlers for the agentic-rag CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod index;
pub mod query;
pub mod serve;
pub mod sessions;
pub mod stats;

pub use index::IndexCommand;
pub use query::QueryCommand;
pub use serve::ServeCommand;
pub use sessions::SessionsCommand;
pub use stats::StatsCommand;

use agentic_core::{AppConfig, AppError, AppResult};
use agentic_knowledge::{IndexOptions, IndexStats, KnowledgeBase};
use agentic_session::SessionStore;
use agentic_workflow::{initialize_knowledge, AgenticRag};
use std::sync::Arc;

/// Workflow plus the knowledge base it retrieves from.
pub struct Runtime {
    pub workflow: AgenticRag,
    pub knowledge: Option<Arc<KnowledgeBase>>,
}

impl Runtime {
    /// Open the workflow. A knowledge base that fails to open leaves the
    /// workflow in limited mode.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        tracing::info!("Initializing Agentic RAG system...");
        let knowledge = initialize_knowledge(config);
        let workflow = AgenticRag::from_config(config, knowledge.clone())?;
        Ok(Self {
            workflow,
            knowledge,
        })
    }

    pub async fn index(&self, options: IndexOptions) -> AppResult<IndexStats> {
        let knowledge = self.knowledge.as_ref().ok_or_else(|| {
            AppError::Knowledge("Knowledge base is not available; cannot index".to_string())
        })?;
        knowledge.index_documents(options).await
    }
}

pub fn open_sessions(config: &AppConfig) -> AppResult<SessionStore> {
    SessionStore::open(&config.sessions_path(), config.session.clone())
}

pub fn to_json_string<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Serialization(e.to_string()))
}
