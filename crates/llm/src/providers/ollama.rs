//! Ollama LLM provider implementation.
//!
//! Talks to the `/api/chat` endpoint so conversation history and system
//! prompts travel as separate messages.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use super::lines::{LineEvent, LineStream};
use crate::client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use agentic_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Ollama chat request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Default)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama chat response format (also used for each NDJSON stream line).
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    #[serde(default)]
    message: Option<OllamaMessage>,
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

impl OllamaChatResponse {
    fn usage(&self) -> LlmUsage {
        LlmUsage::new(
            self.prompt_eval_count.unwrap_or(0),
            self.eval_count.unwrap_or(0),
        )
    }

    fn into_chunk(self) -> LlmStreamChunk {
        let usage = if self.done { Some(self.usage()) } else { None };
        LlmStreamChunk {
            content: self.message.map(|m| m.content).unwrap_or_default(),
            model: self.model,
            done: self.done,
            usage,
        }
    }
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434")
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn to_chat_request(&self, request: &LlmRequest, stream: bool) -> OllamaChatRequest {
        OllamaChatRequest {
            model: request.model.clone(),
            messages: request.messages(),
            stream,
            options: OllamaOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.max_tokens,
            },
        }
    }

    async fn post(&self, body: &OllamaChatRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one NDJSON line of a streaming chat response.
fn parse_stream_line(line: &str) -> AppResult<LlmStreamChunk> {
    let response: OllamaChatResponse = serde_json::from_str(line)
        .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))?;
    Ok(response.into_chunk())
}

fn parse_ndjson_line(line: &str, _model: &str) -> LineEvent {
    match parse_stream_line(line) {
        Ok(chunk) if chunk.done => LineEvent::Last(chunk),
        other => LineEvent::Chunk(other),
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!("Sending chat request to Ollama (model: {})", request.model);

        let body = self.to_chat_request(request, false);
        let response = self.post(&body).await?;

        let chat: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        let usage = chat.usage();
        tracing::debug!(
            "Received completion from Ollama ({} tokens)",
            usage.total_tokens
        );

        Ok(LlmResponse {
            content: chat.message.map(|m| m.content).unwrap_or_default(),
            model: chat.model,
            usage,
            finish_reason: chat.done_reason,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::debug!("Starting streaming chat request to Ollama");

        let body = self.to_chat_request(request, true);
        let response = self.post(&body).await?;

        // Ollama sends newline-delimited JSON
        let state = LineStream::new(
            Box::pin(response.bytes_stream()),
            request.model.clone(),
            parse_ndjson_line,
        );
        Ok(Box::pin(futures::stream::unfold(state, LineStream::next)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::with_base_url("http://localhost:11434/");
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_chat_request_conversion() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_system("Be terse")
            .with_temperature(0.0)
            .with_max_tokens(100);

        let chat = client.to_chat_request(&request, false);
        assert_eq!(chat.model, "llama3.2");
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[1].content, "Hello");
        assert_eq!(chat.options.temperature, Some(0.0));
        assert_eq!(chat.options.num_predict, Some(100));
        assert!(!chat.stream);
    }

    #[test]
    fn test_parse_stream_line() {
        let chunk = parse_stream_line(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Hi"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(chunk.content, "Hi");
        assert!(!chunk.done);
        assert!(chunk.usage.is_none());

        let last = parse_stream_line(
            r#"{"model":"llama3.2","done":true,"prompt_eval_count":3,"eval_count":4}"#,
        )
        .unwrap();
        assert!(last.done);
        assert_eq!(last.usage, Some(LlmUsage::new(3, 4)));

        assert!(parse_stream_line("not json").is_err());
    }

    #[tokio::test]
    async fn test_ndjson_stream_reassembles_split_lines() {
        let body = concat!(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Olá, "},"done":false}"#,
            "\n",
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"mundo"},"done":false}"#,
            "\n",
            r#"{"model":"llama3.2","done":true,"eval_count":2}"#,
            "\n",
        )
        .as_bytes();
        // Split inside the two-byte 'á'
        let split = body.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let parts: Vec<Result<Vec<u8>, reqwest::Error>> =
            vec![Ok(body[..split].to_vec()), Ok(body[split..].to_vec())];

        let state = LineStream::new(
            futures::stream::iter(parts),
            "llama3.2".to_string(),
            parse_ndjson_line,
        );
        let chunks: Vec<LlmStreamChunk> = futures::stream::unfold(state, LineStream::next)
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        let text: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(text, "Olá, mundo");
        assert_eq!(chunks.len(), 3);
        assert!(chunks[2].done);
    }
}
