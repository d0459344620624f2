//! Retrieval need assessment.

use super::{parse_yes_no, AgentContext};
use agentic_core::AppResult;
use agentic_prompt::ids;

/// Decides whether a query needs external information.
#[derive(Clone)]
pub struct NeedsMoreInfo {
    context: AgentContext,
}

impl NeedsMoreInfo {
    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    pub async fn check(&self, query: &str) -> AppResult<bool> {
        tracing::info!("Checking if query needs more info: {}", query);

        let response = self
            .context
            .complete(ids::NEEDS_INFO, &[("query", query)], &[])
            .await?;
        let needs_info = parse_yes_no(&response);

        tracing::info!("Needs more info: {}", needs_info);
        Ok(needs_info)
    }
}
