//! Workflow stages backed by a single LLM call each.

pub mod evaluator;
pub mod generator;
pub mod needs_info;
pub mod rewriter;
pub mod source_selector;

pub use evaluator::AnswerEvaluator;
pub use generator::AnswerGenerator;
pub use needs_info::NeedsMoreInfo;
pub use rewriter::QueryRewriter;
pub use source_selector::SourceSelector;

use crate::prompts::PromptLibrary;
use agentic_core::AppResult;
use agentic_llm::{ChatMessage, LlmClient, LlmRequest};
use futures::StreamExt;
use std::sync::Arc;

/// Temperature for prompts that do not set one, unless configured otherwise.
pub const DEFAULT_TEMPERATURE: f32 = 0.4;

/// Receives answer text as the model produces it.
pub type AnswerSink = dyn Fn(&str) + Send + Sync;

/// Model access shared by all stages.
#[derive(Clone)]
pub struct AgentContext {
    client: Arc<dyn LlmClient>,
    model: String,
    prompts: Arc<PromptLibrary>,
    default_temperature: f32,
}

impl AgentContext {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            prompts,
            default_temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Temperature used when a prompt leaves it unset.
    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(
        &self,
        prompt_id: &str,
        variables: &[(&str, &str)],
        history: &[ChatMessage],
    ) -> AppResult<LlmRequest> {
        let built = self.prompts.render(prompt_id, variables)?;
        let temperature = built.temperature.unwrap_or(self.default_temperature);

        let mut request =
            LlmRequest::new(built.user, self.model.as_str()).with_temperature(temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = built.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if !history.is_empty() {
            request = request.with_history(history.to_vec());
        }

        tracing::debug!(
            "Calling {} with prompt '{}'",
            self.client.provider_name(),
            prompt_id
        );

        Ok(request)
    }

    /// Render prompt `prompt_id` and return the model's reply.
    pub(crate) async fn complete(
        &self,
        prompt_id: &str,
        variables: &[(&str, &str)],
        history: &[ChatMessage],
    ) -> AppResult<String> {
        let request = self.request(prompt_id, variables, history)?;
        let response = self.client.complete(&request).await?;
        Ok(response.content)
    }

    /// Like [`complete`](Self::complete), passing each piece of the reply to
    /// `sink` as it arrives.
    pub(crate) async fn stream(
        &self,
        prompt_id: &str,
        variables: &[(&str, &str)],
        history: &[ChatMessage],
        sink: &AnswerSink,
    ) -> AppResult<String> {
        let request = self.request(prompt_id, variables, history)?.with_streaming();
        let mut stream = self.client.stream(&request).await?;

        let mut content = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if !chunk.content.is_empty() {
                sink(&chunk.content);
                content.push_str(&chunk.content);
            }
            if chunk.done {
                break;
            }
        }

        Ok(content)
    }
}

/// Read a YES/NO verdict. Anything but YES counts as no.
pub fn parse_yes_no(response: &str) -> bool {
    let verdict = response.trim().to_uppercase();
    let verdict =
        verdict.trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    verdict == "YES"
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use agentic_llm::ScriptedClient;
    use tempfile::TempDir;

    /// Agent context backed by a scripted client with built-in prompts.
    pub fn scripted_context(replies: &[&str]) -> (AgentContext, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient::new(replies.iter().copied()));
        let temp = TempDir::new().unwrap();
        let prompts = Arc::new(PromptLibrary::load(temp.path()).unwrap());
        (
            AgentContext::new(client.clone(), "test-model", prompts),
            client,
        )
    }
}
