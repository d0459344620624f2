//! Context window helpers for stored conversations.

use crate::types::{RoleCounts, StoredMessage};
use agentic_llm::ChatRole;

/// Keep the last `max` messages. A `max` of 0 keeps nothing.
pub fn sliding_window<T: Clone>(messages: &[T], max: usize) -> Vec<T> {
    if messages.len() <= max {
        return messages.to_vec();
    }

    let kept = messages[messages.len() - max..].to_vec();
    tracing::debug!(
        "Filtered messages: {} -> {} (sliding window: {})",
        messages.len(),
        kept.len(),
        max
    );
    kept
}

pub fn count_by_role(messages: &[StoredMessage]) -> RoleCounts {
    let mut counts = RoleCounts::default();
    for message in messages {
        match ChatRole::parse(&message.role) {
            Some(ChatRole::User) => counts.user += 1,
            Some(ChatRole::Assistant) => counts.assistant += 1,
            Some(ChatRole::System) => counts.system += 1,
            None => counts.other += 1,
        }
    }
    counts
}

/// One-line description of a conversation for logs.
pub fn summary(messages: &[StoredMessage]) -> String {
    if messages.is_empty() {
        return "No messages".to_string();
    }

    let counts = count_by_role(messages);
    format!(
        "Total: {} messages (User: {}, Assistant: {}, System: {})",
        messages.len(),
        counts.user,
        counts.assistant,
        counts.system
    )
}
