//! Query rewriting.

use super::AgentContext;
use agentic_llm::ChatMessage;
use agentic_prompt::ids;

/// Conversation turns shown to the contextual rewrite prompt.
const HISTORY_TURNS: usize = 5;

/// Rewrites user queries into self-contained, search-friendly form.
#[derive(Clone)]
pub struct QueryRewriter {
    context: AgentContext,
}

impl QueryRewriter {
    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    /// Rewrite `query`. Falls back to the query itself when the model fails
    /// or returns something unusable.
    pub async fn rewrite(&self, query: &str, history: &[ChatMessage]) -> String {
        tracing::info!("Rewriting query: {}", query);

        let result = if history.is_empty() {
            self.context
                .complete(ids::REWRITE, &[("query", query)], &[])
                .await
        } else {
            let rendered = render_history(history);
            self.context
                .complete(
                    ids::REWRITE_CONTEXTUAL,
                    &[("query", query), ("history", rendered.as_str())],
                    &[],
                )
                .await
        };

        match result {
            Ok(response) => {
                let rewritten = clean_rewrite(query, &response);
                tracing::info!("Rewritten query: {}", rewritten);
                rewritten
            }
            Err(e) => {
                tracing::warn!("Query rewrite failed, keeping original: {}", e);
                query.to_string()
            }
        }
    }
}

fn render_history(history: &[ChatMessage]) -> String {
    let start = history.len().saturating_sub(HISTORY_TURNS);
    history[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_rewrite(original: &str, response: &str) -> String {
    let mut text = response.trim();

    const PREFIX: &str = "rewritten query:";
    if text.len() >= PREFIX.len()
        && text.is_char_boundary(PREFIX.len())
        && text[..PREFIX.len()].eq_ignore_ascii_case(PREFIX)
    {
        text = text[PREFIX.len()..].trim();
    }

    let text = text.trim_matches(|c| c == '"' || c == '\'').trim();

    if text.is_empty() || text.chars().count() > original.chars().count() * 3 {
        return original.to_string();
    }
    text.to_string()
}
