//! Knowledge base for retrieval-augmented generation.
//!
//! Documents are parsed, split into overlapping chunks, embedded and stored
//! in a local SQLite vector store. Indexing is incremental: a JSON manifest
//! of content hashes decides which files need (re)indexing.

pub mod base;
pub mod chunker;
pub mod embeddings;
pub mod manifest;
pub mod parser;
pub mod store;
pub mod types;

pub use base::{format_documents, KnowledgeBase, KnowledgeSettings};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use manifest::{IndexManifest, IndexedFile};
pub use store::{SqliteVectorStore, VectorStore};
pub use types::{
    AddedDocument, DocumentChunk, IndexOptions, IndexStats, KnowledgeStats, RetrievedDocument,
    DEFAULT_EXTENSIONS, SUPPORTED_EXTENSIONS,
};
