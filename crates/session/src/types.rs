//! Session type definitions.

use agentic_llm::{ChatMessage, ChatRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub thread_id: String,
    pub user_id: Option<String>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message as stored in a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Role name as written (`user`, `assistant`, `system`, ...)
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Convert to an LLM chat turn; unknown roles yield `None`.
    pub fn to_chat_message(&self) -> Option<ChatMessage> {
        ChatRole::parse(&self.role).map(|role| ChatMessage::new(role, self.content.clone()))
    }
}

/// Message counts per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub user: usize,
    pub assistant: usize,
    pub system: usize,
    pub other: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: &str) -> StoredMessage {
        StoredMessage {
            role: role.to_string(),
            content: "hi".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_to_chat_message() {
        assert_eq!(
            message("human").to_chat_message(),
            Some(ChatMessage::user("hi"))
        );
        assert_eq!(
            message("assistant").to_chat_message(),
            Some(ChatMessage::assistant("hi"))
        );
        assert_eq!(message("tool").to_chat_message(), None);
    }
}
