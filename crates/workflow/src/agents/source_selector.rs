//! Source selection.

use super::AgentContext;
use crate::state::Source;
use agentic_core::AppResult;
use agentic_prompt::ids;

/// Picks the retrieval source best suited to a query.
#[derive(Clone)]
pub struct SourceSelector {
    context: AgentContext,
}

impl SourceSelector {
    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    pub async fn select(&self, query: &str) -> AppResult<Source> {
        tracing::info!("Selecting source for query: {}", query);

        let response = self
            .context
            .complete(ids::SELECT_SOURCE, &[("query", query)], &[])
            .await?;
        let source = Source::parse(&response);

        tracing::info!("Selected source: {} (model said {:?})", source, response.trim());
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::scripted_context;

    #[tokio::test]
    async fn test_select() {
        let (context, _client) =
            scripted_context(&["web_search", "Tools_API\n", "something else"]);
        let selector = SourceSelector::new(context);

        assert_eq!(selector.select("news today").await.unwrap(), Source::WebSearch);
        assert_eq!(selector.select("2+2").await.unwrap(), Source::ToolsApi);
        assert_eq!(
            selector.select("docs").await.unwrap(),
            Source::VectorDatabase
        );
    }
}
