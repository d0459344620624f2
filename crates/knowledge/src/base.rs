//! The knowledge base: indexing documents and retrieving relevant chunks.

use crate::chunker::split_text;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::manifest::{content_hash, IndexManifest, IndexedFile};
use crate::parser;
use crate::store::{SqliteVectorStore, VectorStore};
use crate::types::{
    AddedDocument, DocumentChunk, IndexOptions, IndexStats, KnowledgeStats, RetrievedDocument,
    SUPPORTED_EXTENSIONS,
};
use agentic_core::{AppConfig, AppError, AppResult};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use walkdir::WalkDir;

/// Chunking and retrieval parameters.
#[derive(Debug, Clone)]
pub struct KnowledgeSettings {
    pub documents_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub index_path: Option<PathBuf>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_relevance_score: f32,
}

impl KnowledgeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            documents_dir: config.documents_dir(),
            manifest_path: config.manifest_path(),
            index_path: Some(config.index_path()),
            chunk_size: config.rag.chunk_size,
            chunk_overlap: config.rag.chunk_overlap,
            min_relevance_score: config.rag.min_relevance_score,
        }
    }
}

/// Documents directory, vector store and embedding provider behind one handle.
pub struct KnowledgeBase {
    settings: KnowledgeSettings,
    store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    // Serialises indexing runs so manifest writes never interleave
    index_lock: Mutex<()>,
}

impl KnowledgeBase {
    /// Open the knowledge base described by `config`.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let settings = KnowledgeSettings::from_config(config);

        std::fs::create_dir_all(config.data_dir()).map_err(|e| {
            AppError::Knowledge(format!(
                "Failed to create data directory {:?}: {}",
                config.data_dir(),
                e
            ))
        })?;

        let store = SqliteVectorStore::open(&config.index_path())?;
        let embeddings = create_provider(&config.embedding)?;

        tracing::info!(
            "Knowledge base ready (documents: {:?}, embeddings: {}/{})",
            settings.documents_dir,
            embeddings.provider_name(),
            embeddings.model_name()
        );

        Ok(Self::with_components(settings, Arc::new(store), embeddings))
    }

    /// Assemble a knowledge base from explicit parts.
    pub fn with_components(
        settings: KnowledgeSettings,
        store: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            settings,
            store,
            embeddings,
            index_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &KnowledgeSettings {
        &self.settings
    }

    /// Index new and modified documents.
    pub async fn index_documents(&self, options: IndexOptions) -> AppResult<IndexStats> {
        let _guard = self.index_lock.lock().await;
        let start = Instant::now();

        let dir = options
            .path
            .clone()
            .unwrap_or_else(|| self.settings.documents_dir.clone());

        tracing::info!("Loading documents from {:?}", dir);

        let mut manifest = if options.reset {
            tracing::info!("Resetting knowledge base");
            self.store.reset()?;
            let manifest = IndexManifest::default();
            manifest.save(&self.settings.manifest_path)?;
            manifest
        } else {
            IndexManifest::load(&self.settings.manifest_path)?
        };

        let mut stats = IndexStats::default();

        if !dir.is_dir() {
            tracing::warn!("Documents directory {:?} does not exist", dir);
            return Ok(stats);
        }

        let files = collect_files(&dir, &options.extensions);
        if files.is_empty() {
            tracing::warn!("No documents found in {:?}", dir);
            return Ok(stats);
        }

        tracing::info!(
            "Found {} document files, {} previously indexed",
            files.len(),
            manifest.len()
        );

        for file in files {
            stats.files_seen += 1;

            let outcome = self.index_file(&file, &mut manifest).await;
            match outcome {
                Ok(Some(chunks)) => {
                    stats.files_indexed += 1;
                    stats.chunks_added += chunks;
                }
                Ok(None) => stats.files_skipped += 1,
                Err(e @ AppError::Knowledge(_)) => {
                    tracing::warn!("Skipping {:?}: {}", file, e);
                    stats.files_skipped += 1;
                }
                Err(e) => {
                    manifest.save(&self.settings.manifest_path)?;
                    return Err(e);
                }
            }
        }

        manifest.save(&self.settings.manifest_path)?;
        stats.duration_secs = start.elapsed().as_secs_f64();

        if stats.files_indexed == 0 {
            tracing::info!("No new or modified documents to index");
        } else {
            tracing::info!(
                "Indexed {} new/modified documents ({} chunks) in {:.2}s",
                stats.files_indexed,
                stats.chunks_added,
                stats.duration_secs
            );
        }

        Ok(stats)
    }

    /// Index one file if the manifest says it changed. Returns the chunk count,
    /// or `None` when the file was already up to date.
    async fn index_file(
        &self,
        file: &Path,
        manifest: &mut IndexManifest,
    ) -> AppResult<Option<usize>> {
        let key = file.to_string_lossy().to_string();
        let bytes = std::fs::read(file)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", file, e)))?;
        let hash = content_hash(&bytes);

        if !manifest.needs_indexing(&key, &hash) {
            return Ok(None);
        }

        tracing::info!("New/modified file detected: {:?}", file);

        if manifest.contains(&key) {
            let removed = self.store.delete_source(&key)?;
            tracing::debug!("Removed {} stale chunks for {:?}", removed, file);
        }

        let text = parser::parse_bytes(file, &bytes)?;
        let chunk_count = self.add_text(&key, &text).await?;

        manifest.record(
            key,
            IndexedFile {
                hash,
                modified_at: Utc::now().to_rfc3339(),
                indexed: true,
                chunk_count,
            },
        );

        Ok(Some(chunk_count))
    }

    async fn add_text(&self, source: &str, text: &str) -> AppResult<usize> {
        let pieces = split_text(text, self.settings.chunk_size, self.settings.chunk_overlap)?;
        if pieces.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embeddings.embed_batch(&pieces).await?;
        if embeddings.len() != pieces.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                pieces.len()
            )));
        }

        let chunks: Vec<DocumentChunk> = pieces
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (content, embedding))| DocumentChunk {
                id: uuid::Uuid::new_v4().to_string(),
                source: source.to_string(),
                position: position as u32,
                content,
                embedding,
            })
            .collect();

        self.store.add(&chunks)
    }

    /// Retrieve the `top_k` chunks most similar to `query`.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievedDocument>> {
        if self.store.count()? == 0 {
            tracing::debug!("Vector store is empty");
            return Ok(Vec::new());
        }

        tracing::info!("Retrieving top {} documents for query: {}", top_k, query);

        let embedding = self.embeddings.embed(query).await?;
        let min_score = self.settings.min_relevance_score;

        let documents: Vec<RetrievedDocument> = self
            .store
            .search(&embedding, top_k)?
            .into_iter()
            .filter(|d| d.score >= min_score)
            .collect();

        tracing::info!("Retrieved {} documents", documents.len());
        Ok(documents)
    }

    /// Write an uploaded document into the documents directory and index it.
    pub async fn add_document(&self, filename: &str, content: &str) -> AppResult<AddedDocument> {
        validate_filename(filename)?;
        if content.trim().is_empty() {
            return Err(AppError::Validation(
                "Document content cannot be empty".to_string(),
            ));
        }

        let _guard = self.index_lock.lock().await;

        let dir = &self.settings.documents_dir;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(filename);
        std::fs::write(&path, content)?;

        tracing::info!("Saved uploaded document to {:?}", path);

        let mut manifest = IndexManifest::load(&self.settings.manifest_path)?;
        let chunks = self.index_file(&path, &mut manifest).await?.unwrap_or_else(|| {
            manifest
                .get(&path.to_string_lossy())
                .map(|entry| entry.chunk_count)
                .unwrap_or(0)
        });
        manifest.save(&self.settings.manifest_path)?;

        let hash = content_hash(content.as_bytes());
        Ok(AddedDocument {
            document_id: hash[..16].to_string(),
            filename: filename.to_string(),
            chunks,
        })
    }

    pub fn stats(&self) -> AppResult<KnowledgeStats> {
        let manifest = IndexManifest::load(&self.settings.manifest_path)?;
        let db_size_bytes = self
            .settings
            .index_path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(KnowledgeStats {
            sources: self.store.sources()?.len(),
            chunks: self.store.count()?,
            manifest_entries: manifest.len(),
            db_size_bytes,
        })
    }
}

/// Render retrieved documents as LLM context.
pub fn format_documents(documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return "No relevant documents found.".to_string();
    }

    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[Document {} - Source: {}]\n{}", i + 1, doc.source, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn validate_filename(filename: &str) -> AppResult<()> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Filename cannot be empty".to_string()));
    }
    if trimmed != filename
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(AppError::Validation(format!(
            "Invalid filename '{}': path separators and '..' are not allowed",
            filename
        )));
    }

    let extensions: Vec<String> = SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect();
    if !parser::has_extension(Path::new(filename), &extensions) {
        return Err(AppError::Validation(format!(
            "Unsupported file type '{}'. Supported: {}",
            filename,
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    Ok(())
}

/// Files directly inside `dir` with a matching extension, sorted by path.
fn collect_files(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| parser::has_extension(p, extensions))
        .collect();

    files.sort();
    files
}
