//! Embedding generation for the vector store.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::ollama::OllamaEmbeddingProvider;
pub use providers::trigram::TrigramProvider;
