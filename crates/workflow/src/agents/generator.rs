//! Answer generation.

use super::{AgentContext, AnswerSink};
use agentic_core::AppResult;
use agentic_llm::ChatMessage;
use agentic_prompt::ids;

/// Writes the answer, grounded in retrieved context when there is some.
#[derive(Clone)]
pub struct AnswerGenerator {
    context: AgentContext,
}

impl AnswerGenerator {
    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    pub async fn generate(
        &self,
        query: &str,
        retrieved: &str,
        history: &[ChatMessage],
    ) -> AppResult<String> {
        self.run(query, retrieved, history, None).await
    }

    /// Generate, forwarding the answer to `sink` while it is produced.
    pub async fn generate_streaming(
        &self,
        query: &str,
        retrieved: &str,
        history: &[ChatMessage],
        sink: &AnswerSink,
    ) -> AppResult<String> {
        self.run(query, retrieved, history, Some(sink)).await
    }

    async fn run(
        &self,
        query: &str,
        retrieved: &str,
        history: &[ChatMessage],
        sink: Option<&AnswerSink>,
    ) -> AppResult<String> {
        tracing::info!("Generating answer for query: {}", query);

        let (prompt_id, variables) = if retrieved.trim().is_empty() {
            (ids::ANSWER_DIRECT, vec![("query", query)])
        } else {
            (ids::ANSWER, vec![("query", query), ("context", retrieved)])
        };

        let answer = match sink {
            Some(sink) => {
                self.context
                    .stream(prompt_id, &variables, history, sink)
                    .await?
            }
            None => self.context.complete(prompt_id, &variables, history).await?,
        };

        let answer = answer.trim().to_string();
        tracing::info!("Generated answer ({} chars)", answer.len());
        Ok(answer)
    }
}
