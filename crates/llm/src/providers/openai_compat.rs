//! OpenAI-compatible chat completions provider.
//!
//! Groq exposes the same `/chat/completions` contract as OpenAI, so one
//! client serves both; only the base URL and provider name differ.

use super::lines::{LineEvent, LineStream};
use crate::client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use crate::types::ProviderType;
use agentic_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    delta: Option<ResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl From<ResponseUsage> for LlmUsage {
    fn from(usage: ResponseUsage) -> Self {
        LlmUsage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct OpenAiCompatClient {
    provider: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Client for the Groq API at its default endpoint.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new(
            ProviderType::Groq.as_str(),
            ProviderType::Groq.default_endpoint(),
            api_key,
        )
    }

    fn to_request<'a>(&self, request: &'a LlmRequest, stream: bool) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &request.model,
            messages: request.messages(),
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    async fn post(&self, body: &ChatCompletionRequest<'_>) -> AppResult<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                AppError::Llm(format!("Failed to send request to {}: {}", self.provider, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "{} API error ({}): {}",
                self.provider, status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatClient {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            "Sending chat completion to {} (model: {})",
            self.provider,
            request.model
        );

        let body = self.to_request(request, false);
        let response = self.post(&body).await?;

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::Llm(format!("Failed to parse {} response: {}", self.provider, e))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm(format!("{} returned no choices", self.provider)))?;

        let usage = completion.usage.map(LlmUsage::from).unwrap_or_default();
        tracing::debug!(
            "Received completion from {} ({} tokens)",
            self.provider,
            usage.total_tokens
        );

        Ok(LlmResponse {
            content: choice.message.and_then(|m| m.content).unwrap_or_default(),
            model: completion.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::debug!("Starting streaming chat completion to {}", self.provider);

        let body = self.to_request(request, true);
        let response = self.post(&body).await?;

        let state = LineStream::new(
            Box::pin(response.bytes_stream()),
            request.model.clone(),
            parse_sse_line,
        );
        Ok(Box::pin(futures::stream::unfold(state, LineStream::next)))
    }
}

/// Interpret one line of a chat-completions SSE stream.
fn parse_sse_line(line: &str, model: &str) -> LineEvent {
    let Some(data) = line.strip_prefix("data:") else {
        return LineEvent::Skip;
    };
    let data = data.trim();
    if data.is_empty() {
        return LineEvent::Skip;
    }
    if data == "[DONE]" {
        return LineEvent::Last(LlmStreamChunk {
            content: String::new(),
            model: model.to_string(),
            done: true,
            usage: None,
        });
    }

    let parsed: ChatCompletionResponse = match serde_json::from_str(data) {
        Ok(parsed) => parsed,
        Err(e) => {
            return LineEvent::Chunk(Err(AppError::Llm(format!(
                "Failed to parse chunk: {}",
                e
            ))))
        }
    };

    let usage = parsed.usage.map(LlmUsage::from);
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .unwrap_or_default();

    if content.is_empty() && usage.is_none() {
        return LineEvent::Skip;
    }

    LineEvent::Chunk(Ok(LlmStreamChunk {
        content,
        model: if parsed.model.is_empty() {
            model.to_string()
        } else {
            parsed.model
        },
        done: false,
        usage,
    }))
}
