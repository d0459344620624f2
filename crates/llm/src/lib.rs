//! LLM integration crate for the Agentic RAG system.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! Large Language Models (LLMs). Every workflow stage talks to the model
//! through the [`LlmClient`] trait.
//!
//! # Providers
//! - **Groq** / **OpenAI**: hosted chat-completions APIs (default: Groq)
//! - **Ollama**: local LLM runtime
//! - **Scripted**: queued replies for tests and offline runs
//!
//! # Example
//! ```no_run
//! use agentic_llm::{LlmClient, LlmRequest, providers::OpenAiCompatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiCompatClient::groq("gsk-...");
//! let request = LlmRequest::new("Hello, world!", "llama-3.3-70b-versatile");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk,
    LlmUsage,
};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiCompatClient, ScriptedClient};
pub use types::ProviderType;
