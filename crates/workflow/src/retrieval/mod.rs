//! Context retrieval, one backend per [`Source`].

pub mod calculator;
pub mod tools;
pub mod web_search;

pub use tools::ToolsManager;
pub use web_search::{SearchProvider, SearchResult, WebSearchManager};

use crate::state::Source;
use agentic_core::{AppError, AppResult};
use agentic_knowledge::{format_documents, KnowledgeBase};
use std::sync::Arc;

/// The retrieval backends available to the workflow.
#[derive(Clone)]
pub struct Retrievers {
    knowledge: Option<Arc<KnowledgeBase>>,
    tools: ToolsManager,
    web: WebSearchManager,
    top_k: usize,
}

impl Retrievers {
    pub fn new(
        knowledge: Option<Arc<KnowledgeBase>>,
        tools: ToolsManager,
        web: WebSearchManager,
        top_k: usize,
    ) -> Self {
        Self {
            knowledge,
            tools,
            web,
            top_k,
        }
    }

    pub fn knowledge(&self) -> Option<&Arc<KnowledgeBase>> {
        self.knowledge.as_ref()
    }

    /// Fetch context for `query` from `source`.
    pub async fn retrieve(&self, source: Source, query: &str) -> AppResult<String> {
        tracing::info!("Retrieving from {} for: {}", source, query);

        match source {
            Source::VectorDatabase => {
                let knowledge = self.knowledge.as_ref().ok_or_else(|| {
                    AppError::Retrieval("Knowledge base is not initialized".to_string())
                })?;
                let documents = knowledge.retrieve(query, self.top_k).await?;
                tracing::debug!("Retrieved {} documents", documents.len());
                Ok(format_documents(&documents))
            }
            Source::ToolsApi => Ok(self.tools.retrieve(query)),
            Source::WebSearch => Ok(self.web.search(query).await),
        }
    }
}
