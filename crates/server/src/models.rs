//! Request and response bodies.

use agentic_knowledge::IndexStats;
use agentic_session::{SessionInfo, StoredMessage};
use agentic_workflow::{RagState, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_QUERY_CHARS: usize = 1000;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub thread_id: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten_query: Option<String>,
    pub needs_retrieval: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_source: Option<Source>,
    pub answer_is_relevant: bool,
    pub iteration: u32,
    pub message_count: usize,
}

impl QueryResponse {
    pub fn from_state(state: RagState, thread_id: String, message_count: usize) -> Self {
        Self {
            rewritten_query: Some(state.rewritten_query).filter(|q| !q.is_empty()),
            answer: state.answer,
            thread_id,
            query: state.original_query,
            needs_retrieval: state.needs_retrieval,
            selected_source: state.selected_source,
            answer_is_relevant: state.answer_is_relevant,
            iteration: state.iteration,
            message_count,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<SessionInfo> for SessionResponse {
    fn from(info: SessionInfo) -> Self {
        Self {
            thread_id: info.thread_id,
            user_id: info.user_id,
            message_count: info.message_count,
            created_at: info.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

impl From<StoredMessage> for HistoryMessage {
    fn from(message: StoredMessage) -> Self {
        Self {
            role: message.role,
            content: message.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub thread_id: String,
    pub message_count: usize,
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub status: String,
    pub message: String,
    pub stats: IndexStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub message: String,
}
