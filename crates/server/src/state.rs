//! Shared application state.

use agentic_core::{AppConfig, AppResult};
use agentic_knowledge::KnowledgeBase;
use agentic_session::SessionStore;
use agentic_workflow::{initialize_knowledge, AgenticRag};
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub workflow: Arc<AgenticRag>,
    pub sessions: Arc<SessionStore>,
    /// `None` when the knowledge base failed to open
    pub knowledge: Option<Arc<KnowledgeBase>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        workflow: Arc<AgenticRag>,
        sessions: Arc<SessionStore>,
        knowledge: Option<Arc<KnowledgeBase>>,
    ) -> Self {
        Self {
            config,
            workflow,
            sessions,
            knowledge,
        }
    }

    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.ensure_agentic_dir()?;

        let knowledge = initialize_knowledge(&config);
        let workflow = AgenticRag::from_config(&config, knowledge.clone())?;
        let sessions = SessionStore::open(&config.sessions_path(), config.session.clone())?;

        match sessions.purge_expired() {
            Ok(0) => {}
            Ok(purged) => tracing::info!("Purged {} expired sessions", purged),
            Err(e) => tracing::warn!("Failed to purge expired sessions: {}", e),
        }

        Ok(Self::new(
            config,
            Arc::new(workflow),
            Arc::new(sessions),
            knowledge,
        ))
    }
}
