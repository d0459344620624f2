//! Scripted LLM client.
//!
//! Replies come from a queue in the order they were pushed, which makes
//! multi-step workflows deterministic under test. Every request is recorded
//! so callers can assert on rendered prompts and sampling settings.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use agentic_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum ScriptedReply {
    Text(String),
    Failure(String),
}

/// LLM client that answers from a queue of canned replies.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedClient {
    /// Create a client that returns `replies` in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| ScriptedReply::Text(r.into()))
                    .collect(),
            ),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply used once the queue is empty.
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Queue another successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(ScriptedReply::Text(reply.into()));
    }

    /// Queue a provider failure.
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.replies).push_back(ScriptedReply::Failure(message.into()));
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        lock(&self.requests).clone()
    }

    /// Replies still queued.
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }

    fn next_reply(&self, request: &LlmRequest) -> AppResult<String> {
        lock(&self.requests).push(request.clone());

        match lock(&self.replies).pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Failure(message)) => Err(AppError::Llm(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AppError::Llm("Scripted client has no replies left".to_string())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let content = self.next_reply(request)?;
        Ok(LlmResponse {
            usage: LlmUsage::new(
                request.prompt.split_whitespace().count() as u32,
                content.split_whitespace().count() as u32,
            ),
            content,
            model: request.model.clone(),
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        let content = self.next_reply(request)?;
        let model = request.model.clone();

        let mut chunks: Vec<AppResult<LlmStreamChunk>> = content
            .split_inclusive(' ')
            .map(|piece| {
                Ok(LlmStreamChunk {
                    content: piece.to_string(),
                    model: model.clone(),
                    done: false,
                    usage: None,
                })
            })
            .collect();
        chunks.push(Ok(LlmStreamChunk {
            content: String::new(),
            model,
            done: true,
            usage: None,
        }));

        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_replies_in_order_then_fallback() {
        let client = ScriptedClient::new(["first", "second"]).with_fallback("again");
        let request = LlmRequest::new("q", "m");

        assert_eq!(client.complete(&request).await.unwrap().content, "first");
        assert_eq!(client.complete(&request).await.unwrap().content, "second");
        assert_eq!(client.complete(&request).await.unwrap().content, "again");
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_queue_errors() {
        let client = ScriptedClient::new(Vec::<String>::new());
        let result = client.complete(&LlmRequest::new("q", "m")).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_queued_failure() {
        let client = ScriptedClient::new(["ok"]);
        client.push_error("rate limited");
        let request = LlmRequest::new("q", "m");

        assert!(client.complete(&request).await.is_ok());
        match client.complete(&request).await {
            Err(AppError::Llm(msg)) => assert_eq!(msg, "rate limited"),
            other => panic!("unexpected: {:?}", other.map(|r| r.content)),
        }
    }

    #[tokio::test]
    async fn test_stream_reassembles() {
        let client = ScriptedClient::new(["hello streaming world"]);
        let mut stream = client.stream(&LlmRequest::new("q", "m")).await.unwrap();

        let mut text = String::new();
        let mut saw_done = false;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            text.push_str(&chunk.content);
            saw_done |= chunk.done;
        }
        assert_eq!(text, "hello streaming world");
        assert!(saw_done);
    }
}
