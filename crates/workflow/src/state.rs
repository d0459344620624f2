//! Workflow state.

use agentic_llm::ChatMessage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the retriever looks for context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    VectorDatabase,
    ToolsApi,
    WebSearch,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::VectorDatabase, Source::ToolsApi, Source::WebSearch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VectorDatabase => "vector_database",
            Self::ToolsApi => "tools_api",
            Self::WebSearch => "web_search",
        }
    }

    /// Interpret a model's source choice.
    ///
    /// An exact identifier wins; otherwise the response must mention exactly
    /// one identifier. Anything else selects the vector database.
    pub fn parse(response: &str) -> Self {
        let normalized = response.trim().to_lowercase();
        let normalized = normalized.trim_matches(|c: char| !c.is_alphanumeric() && c != '_');

        if let Some(source) = Self::ALL.iter().find(|s| s.as_str() == normalized) {
            return *source;
        }

        let mentioned: Vec<Source> = Self::ALL
            .iter()
            .copied()
            .filter(|s| normalized.contains(s.as_str()))
            .collect();

        match mentioned.as_slice() {
            [single] => *single,
            _ => Self::VectorDatabase,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the workflow knows about one query run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagState {
    pub original_query: String,
    pub rewritten_query: String,
    pub needs_retrieval: bool,
    /// Set only when retrieval happens in the current iteration
    pub selected_source: Option<Source>,
    pub retrieved_context: String,
    pub answer: String,
    pub answer_is_relevant: bool,
    /// Completed evaluate steps
    pub iteration: u32,
    pub max_iterations: u32,
    pub error: Option<String>,
    /// Human-readable trace, one entry per step
    pub messages: Vec<String>,
    /// Prior conversation turns, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
}

impl RagState {
    pub fn new(query: impl Into<String>, max_iterations: u32, history: Vec<ChatMessage>) -> Self {
        Self {
            original_query: query.into(),
            rewritten_query: String::new(),
            needs_retrieval: false,
            selected_source: None,
            retrieved_context: String::new(),
            answer: String::new(),
            answer_is_relevant: false,
            iteration: 0,
            max_iterations,
            error: None,
            messages: Vec::new(),
            history,
        }
    }

    /// The query the stages work with: the rewrite once there is one.
    pub fn working_query(&self) -> &str {
        if self.rewritten_query.is_empty() {
            &self.original_query
        } else {
            &self.rewritten_query
        }
    }

    pub(crate) fn trace(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{}", message);
        self.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_exact() {
        assert_eq!(Source::parse("tools_api"), Source::ToolsApi);
        assert_eq!(Source::parse("  WEB_SEARCH\n"), Source::WebSearch);
        assert_eq!(Source::parse("vector_database."), Source::VectorDatabase);
    }

    #[test]
    fn test_source_parse_single_mention() {
        assert_eq!(
            Source::parse("I would pick web_search for this"),
            Source::WebSearch
        );
    }

    #[test]
    fn test_source_parse_fallback() {
        assert_eq!(Source::parse("the internet"), Source::VectorDatabase);
        assert_eq!(Source::parse(""), Source::VectorDatabase);
        assert_eq!(
            Source::parse("either tools_api or web_search"),
            Source::VectorDatabase
        );
    }

    #[test]
    fn test_source_serde_matches_as_str() {
        for source in Source::ALL {
            let json = serde_json::to_string(&source).unwrap();
            assert_eq!(json, format!("\"{}\"", source.as_str()));
        }
    }

    #[test]
    fn test_new_state() {
        let state = RagState::new("What is Rust?", 3, Vec::new());
        assert_eq!(state.original_query, "What is Rust?");
        assert_eq!(state.working_query(), "What is Rust?");
        assert_eq!(state.iteration, 0);
        assert_eq!(state.max_iterations, 3);
        assert!(state.selected_source.is_none());
        assert!(state.error.is_none());
    }
}
