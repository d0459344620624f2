//! Answer evaluation.

use super::{parse_yes_no, AgentContext};
use agentic_core::AppResult;
use agentic_prompt::ids;

const NO_CONTEXT: &str = "No context provided";

/// Judges whether an answer addresses the query.
#[derive(Clone)]
pub struct AnswerEvaluator {
    context: AgentContext,
}

impl AnswerEvaluator {
    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    pub async fn evaluate(&self, query: &str, answer: &str, retrieved: &str) -> AppResult<bool> {
        tracing::info!("Evaluating answer for query: {}", query);

        let retrieved = if retrieved.trim().is_empty() {
            NO_CONTEXT
        } else {
            retrieved
        };

        let response = self
            .context
            .complete(
                ids::EVALUATE,
                &[("query", query), ("answer", answer), ("context", retrieved)],
                &[],
            )
            .await?;
        let is_relevant = parse_yes_no(&response);

        tracing::info!("Answer is relevant: {}", is_relevant);
        Ok(is_relevant)
    }
}
