//! Orchestration of the workflow stages.

use crate::agents::{
    AgentContext, AnswerEvaluator, AnswerGenerator, AnswerSink, NeedsMoreInfo, QueryRewriter,
    SourceSelector,
};
use crate::prompts::PromptLibrary;
use crate::retrieval::{Retrievers, ToolsManager, WebSearchManager};
use crate::state::{RagState, Source};
use agentic_core::{AppConfig, AppError, AppResult, ProviderConfig};
use agentic_knowledge::KnowledgeBase;
use agentic_llm::{create_client, ChatMessage, LlmClient};
use std::sync::Arc;

/// Characters of the answer shown in the trace.
const TRACE_ANSWER_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub model: String,
    /// Used by prompts that do not set their own temperature
    pub temperature: f32,
    pub max_iterations: u32,
}

impl WorkflowSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_iterations: config.rag.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Rewrite,
    CheckNeedsInfo,
    SelectSource,
    Retrieve,
    Generate,
    Evaluate,
    Done,
}

/// The agentic RAG workflow.
pub struct AgenticRag {
    rewriter: QueryRewriter,
    needs_info: NeedsMoreInfo,
    selector: SourceSelector,
    generator: AnswerGenerator,
    evaluator: AnswerEvaluator,
    retrievers: Retrievers,
    settings: WorkflowSettings,
}

impl AgenticRag {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        retrievers: Retrievers,
        settings: WorkflowSettings,
    ) -> Self {
        let context = AgentContext::new(client, settings.model.clone(), prompts)
            .with_default_temperature(settings.temperature);
        Self {
            rewriter: QueryRewriter::new(context.clone()),
            needs_info: NeedsMoreInfo::new(context.clone()),
            selector: SourceSelector::new(context.clone()),
            generator: AnswerGenerator::new(context.clone()),
            evaluator: AnswerEvaluator::new(context),
            retrievers,
            settings,
        }
    }

    /// Build the workflow from configuration. `knowledge` is `None` in
    /// limited mode.
    pub fn from_config(
        config: &AppConfig,
        knowledge: Option<Arc<KnowledgeBase>>,
    ) -> AppResult<Self> {
        let client = create_llm_client(config)?;
        let prompts = Arc::new(PromptLibrary::load(&config.workspace)?);
        let retrievers = Retrievers::new(
            knowledge,
            ToolsManager::new(),
            WebSearchManager::new(&config.search),
            config.rag.retrieval_top_k,
        );

        tracing::info!(
            "Workflow ready (provider: {}, model: {}, max iterations: {})",
            client.provider_name(),
            config.model,
            config.rag.max_iterations
        );

        Ok(Self::new(
            client,
            prompts,
            retrievers,
            WorkflowSettings::from_config(config),
        ))
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn retrievers(&self) -> &Retrievers {
        &self.retrievers
    }

    /// Process one query to completion.
    ///
    /// Never fails: a stage error is recorded in `error` and surfaced as the
    /// answer, with every other field left as the failing stage found it.
    pub async fn run(&self, query: &str, history: Vec<ChatMessage>) -> RagState {
        self.execute(query, history, None).await
    }

    /// Like [`run`](Self::run), passing each generated answer to `sink` as
    /// the model writes it. A retry streams its new answer after a blank line.
    pub async fn run_streaming(
        &self,
        query: &str,
        history: Vec<ChatMessage>,
        sink: &AnswerSink,
    ) -> RagState {
        self.execute(query, history, Some(sink)).await
    }

    async fn execute(
        &self,
        query: &str,
        history: Vec<ChatMessage>,
        sink: Option<&AnswerSink>,
    ) -> RagState {
        tracing::info!("Processing query: {}", query);

        let mut state = RagState::new(query, self.settings.max_iterations.max(1), history);
        let mut step = Step::Rewrite;

        while step != Step::Done {
            step = match self.advance(step, &mut state, sink).await {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!("Workflow failed at {:?}: {}", step, e);
                    state.error = Some(e.to_string());
                    state.answer = format!("Error: {}", e);
                    Step::Done
                }
            };
        }

        tracing::info!(
            "Query completed in {} iteration(s), relevant: {}",
            state.iteration,
            state.answer_is_relevant
        );
        state
    }

    async fn advance(
        &self,
        step: Step,
        state: &mut RagState,
        sink: Option<&AnswerSink>,
    ) -> AppResult<Step> {
        match step {
            Step::Rewrite => {
                state.retrieved_context.clear();
                state.selected_source = None;

                let rewritten = self
                    .rewriter
                    .rewrite(&state.original_query, &state.history)
                    .await;
                state.trace(format!("Rewritten query: {}", rewritten));
                state.rewritten_query = rewritten;
                Ok(Step::CheckNeedsInfo)
            }
            Step::CheckNeedsInfo => {
                let needs = self.needs_info.check(state.working_query()).await?;
                state.needs_retrieval = needs;
                state.trace(format!("Needs retrieval: {}", needs));
                Ok(if needs {
                    Step::SelectSource
                } else {
                    Step::Generate
                })
            }
            Step::SelectSource => {
                let source = self.selector.select(state.working_query()).await?;
                state.selected_source = Some(source);
                state.trace(format!("Selected source: {}", source));
                Ok(Step::Retrieve)
            }
            Step::Retrieve => {
                let source = state.selected_source.unwrap_or(Source::VectorDatabase);
                state.retrieved_context = match self
                    .retrievers
                    .retrieve(source, state.working_query())
                    .await
                {
                    Ok(context) => {
                        tracing::info!("Retrieved context length: {}", context.len());
                        context
                    }
                    Err(e) => {
                        tracing::error!("Retrieval from {} failed: {}", source, e);
                        format!("Error during retrieval: {}", e)
                    }
                };
                state.trace(format!("Retrieved context from {}", source));
                Ok(Step::Generate)
            }
            Step::Generate => {
                let query = state.working_query();
                let answer = match sink {
                    Some(sink) => {
                        if state.iteration > 0 {
                            sink("\n\n");
                        }
                        self.generator
                            .generate_streaming(
                                query,
                                &state.retrieved_context,
                                &state.history,
                                sink,
                            )
                            .await?
                    }
                    None => {
                        self.generator
                            .generate(query, &state.retrieved_context, &state.history)
                            .await?
                    }
                };
                let preview: String = answer.chars().take(TRACE_ANSWER_CHARS).collect();
                state.trace(format!("Generated answer: {}...", preview));
                state.answer = answer;
                Ok(Step::Evaluate)
            }
            Step::Evaluate => {
                let relevant = self
                    .evaluator
                    .evaluate(
                        state.working_query(),
                        &state.answer,
                        &state.retrieved_context,
                    )
                    .await?;
                state.iteration += 1;
                state.answer_is_relevant = relevant;
                state.trace(format!(
                    "Answer is relevant: {} (Iteration: {})",
                    relevant, state.iteration
                ));

                if relevant || state.iteration >= state.max_iterations {
                    Ok(Step::Done)
                } else {
                    tracing::info!("Answer not relevant, retrying");
                    Ok(Step::Rewrite)
                }
            }
            Step::Done => Ok(Step::Done),
        }
    }
}

/// Create the LLM client for the configured provider.
pub fn create_llm_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let endpoint = config.endpoint.as_deref().or_else(|| {
        match config.get_provider_config(&config.provider) {
            Some(ProviderConfig::Ollama { endpoint, .. }) => Some(endpoint.as_str()),
            Some(ProviderConfig::Hosted { endpoint, .. }) => endpoint.as_deref(),
            None => None,
        }
    });

    let api_key = config.resolve_api_key(&config.provider);

    create_client(&config.provider, endpoint, api_key.as_deref()).map_err(AppError::Config)
}

/// Open the knowledge base, or `None` when it cannot be opened.
pub fn initialize_knowledge(config: &AppConfig) -> Option<Arc<KnowledgeBase>> {
    match KnowledgeBase::open(config) {
        Ok(knowledge) => Some(Arc::new(knowledge)),
        Err(e) => {
            tracing::warn!("Knowledge base unavailable, running in limited mode: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_core::SearchSettings;
    use agentic_llm::ScriptedClient;
    use tempfile::TempDir;

    fn workflow(replies: &[&str], max_iterations: u32) -> (AgenticRag, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient::new(replies.iter().copied()));
        let temp = TempDir::new().unwrap();
        let prompts = Arc::new(PromptLibrary::load(temp.path()).unwrap());
        let retrievers = Retrievers::new(
            None,
            ToolsManager::new(),
            WebSearchManager::new(&SearchSettings {
                tavily_api_key: None,
                serpapi_api_key: None,
                max_results: 5,
            }),
            3,
        );
        let settings = WorkflowSettings {
            model: "test-model".to_string(),
            temperature: 0.4,
            max_iterations,
        };
        (
            AgenticRag::new(client.clone(), prompts, retrievers, settings),
            client,
        )
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let (rag, client) = workflow(
            &["What is Rust?", "NO", "Rust is a systems language.", "YES"],
            3,
        );

        let state = rag.run("wat is rust", Vec::new()).await;

        assert_eq!(state.original_query, "wat is rust");
        assert_eq!(state.rewritten_query, "What is Rust?");
        assert!(!state.needs_retrieval);
        assert!(state.selected_source.is_none());
        assert!(state.retrieved_context.is_empty());
        assert_eq!(state.answer, "Rust is a systems language.");
        assert!(state.answer_is_relevant);
        assert_eq!(state.iteration, 1);
        assert!(state.error.is_none());
        assert_eq!(
            state.messages,
            vec![
                "Rewritten query: What is Rust?",
                "Needs retrieval: false",
                "Generated answer: Rust is a systems language....",
                "Answer is relevant: true (Iteration: 1)",
            ]
        );
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test]
    async fn test_tools_retrieval_path() {
        let (rag, client) = workflow(
            &["What is 6 * 7?", "YES", "tools_api", "It is 42.", "YES"],
            3,
        );

        let state = rag.run("6 times 7, i.e. 6 * 7", Vec::new()).await;

        assert!(state.needs_retrieval);
        assert_eq!(state.selected_source, Some(Source::ToolsApi));
        assert!(state.retrieved_context.contains("Result: 42"));
        assert_eq!(state.answer, "It is 42.");
        assert_eq!(state.messages[2], "Selected source: tools_api");
        assert_eq!(state.messages[3], "Retrieved context from tools_api");

        let generate_prompt = &client.requests()[3].prompt;
        assert!(generate_prompt.contains("Result: 42"));
    }

    #[tokio::test]
    async fn test_retries_until_max_iterations() {
        let (rag, client) = workflow(&["q1", "NO", "a1", "NO", "q2", "NO", "a2", "NO"], 2);

        let state = rag.run("question", Vec::new()).await;

        assert_eq!(state.iteration, 2);
        assert!(!state.answer_is_relevant);
        assert_eq!(state.rewritten_query, "q2");
        assert_eq!(state.answer, "a2");
        assert!(state.error.is_none());
        assert_eq!(client.remaining(), 0);
    }

    #[tokio::test]
    async fn test_retry_discards_previous_context() {
        let (rag, _client) = workflow(
            &[
                "What is 2 + 2?", "YES", "tools_api", "4", "NO",
                "What is two plus two?", "NO", "Four.", "YES",
            ],
            3,
        );

        let state = rag.run("2 + 2", Vec::new()).await;

        assert_eq!(state.iteration, 2);
        assert!(state.answer_is_relevant);
        assert!(!state.needs_retrieval);
        assert!(state.selected_source.is_none());
        assert!(state.retrieved_context.is_empty());
        assert_eq!(state.answer, "Four.");
    }

    #[tokio::test]
    async fn test_retrieval_error_becomes_context() {
        let (rag, client) = workflow(
            &["Rust docs", "YES", "vector_database", "I could not find it.", "YES"],
            3,
        );

        let state = rag.run("rust docs", Vec::new()).await;

        assert!(state.error.is_none());
        assert!(state
            .retrieved_context
            .starts_with("Error during retrieval: "));
        assert_eq!(state.messages[3], "Retrieved context from vector_database");
        assert!(client.requests()[3]
            .prompt
            .contains("Error during retrieval: "));
    }

    #[tokio::test]
    async fn test_stage_error_ends_run() {
        let (rag, client) = workflow(&["Rewritten"], 3);
        client.push_error("service unavailable");

        let state = rag.run("question", Vec::new()).await;

        let error = state.error.clone().unwrap();
        assert!(error.contains("service unavailable"));
        assert_eq!(state.answer, format!("Error: {}", error));
        assert_eq!(state.rewritten_query, "Rewritten");
        assert_eq!(state.iteration, 0);
        assert_eq!(state.messages, vec!["Rewritten query: Rewritten"]);
    }

    #[tokio::test]
    async fn test_history_reaches_rewriter_and_generator() {
        let (rag, client) = workflow(&["What is Ana's name?", "NO", "Ana.", "YES"], 3);
        let history = vec![
            ChatMessage::user("My name is Ana"),
            ChatMessage::assistant("Hello Ana!"),
        ];

        let state = rag.run("what is my name", history.clone()).await;
        assert_eq!(state.answer, "Ana.");

        let requests = client.requests();
        assert!(requests[0].prompt.contains("user: My name is Ana"));
        assert_eq!(requests[2].history, history);
        assert!(requests[1].history.is_empty());
    }

    #[tokio::test]
    async fn test_run_streaming_sends_each_generated_answer() {
        let (rag, client) = workflow(
            &["q1", "NO", "first try", "NO", "q2", "NO", "second", "YES"],
            3,
        );
        let streamed: &'static _ = Box::leak(Box::new(std::sync::Mutex::new(Vec::new())));
        let sink = move |piece: &str| streamed.lock().unwrap().push(piece.to_string());

        let state = rag.run_streaming("question", Vec::new(), &sink).await;

        assert_eq!(state.answer, "second");
        assert_eq!(state.iteration, 2);
        assert_eq!(*streamed.lock().unwrap(), vec!["first ", "try", "\n\n", "second"]);

        let requests = client.requests();
        assert!(requests[2].stream);
        assert!(!requests[3].stream);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = AppConfig::default();
        config.temperature = 0.9;
        config.rag.max_iterations = 5;

        let settings = WorkflowSettings::from_config(&config);
        assert_eq!(settings.temperature, 0.9);
        assert_eq!(settings.max_iterations, 5);
        assert_eq!(settings.model, config.model);
    }

    #[test]
    fn test_create_llm_client() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        assert_eq!(create_llm_client(&config).unwrap().provider_name(), "ollama");

        config.provider = "nope".to_string();
        assert!(matches!(create_llm_client(&config), Err(AppError::Config(_))));
    }
}
