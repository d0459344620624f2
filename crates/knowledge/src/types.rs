//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extensions indexed when no explicit list is given.
pub const DEFAULT_EXTENSIONS: &[&str] = &["txt"];

/// Every extension the parser knows how to read.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// A chunk of a source document with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Source file the chunk was cut from
    pub source: String,

    /// Position of the chunk within the source
    pub position: u32,

    /// Chunk text
    pub content: String,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub source: String,
    pub content: String,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Options for an indexing run.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Clear the store and manifest before indexing
    pub reset: bool,

    /// Directory to scan instead of the configured documents directory
    pub path: Option<PathBuf>,

    /// File extensions to pick up, without the leading dot
    pub extensions: Vec<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            reset: false,
            path: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Statistics from an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_seen: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub chunks_added: usize,
    pub duration_secs: f64,
}

/// Result of adding a single uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedDocument {
    pub document_id: String,
    pub filename: String,
    pub chunks: usize,
}

/// Overall knowledge base statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    /// Distinct sources in the vector store
    pub sources: usize,
    pub chunks: usize,
    pub manifest_entries: usize,
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_index_options_only_pick_text_files() {
        let options = IndexOptions::default();
        assert!(!options.reset);
        assert!(options.path.is_none());
        assert_eq!(options.extensions, vec!["txt".to_string()]);
    }

    #[test]
    fn test_index_stats_serialization() {
        let stats = IndexStats {
            files_seen: 3,
            files_indexed: 2,
            files_skipped: 1,
            chunks_added: 7,
            duration_secs: 0.5,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["files_indexed"], 2);
        assert_eq!(json["chunks_added"], 7);
    }
}
