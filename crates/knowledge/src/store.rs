//! SQLite-backed vector store for document chunks.

use crate::types::{DocumentChunk, RetrievedDocument};
use agentic_core::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Storage and similarity search over embedded chunks.
pub trait VectorStore: Send + Sync {
    /// Insert chunks, returning how many were written.
    fn add(&self, chunks: &[DocumentChunk]) -> AppResult<usize>;

    /// Top `k` chunks by cosine similarity, highest first.
    fn search(&self, embedding: &[f32], k: usize) -> AppResult<Vec<RetrievedDocument>>;

    /// Remove every chunk cut from `source`, returning how many were removed.
    fn delete_source(&self, source: &str) -> AppResult<usize>;

    fn count(&self) -> AppResult<usize>;

    /// Distinct sources, sorted.
    fn sources(&self) -> AppResult<Vec<String>>;

    fn reset(&self) -> AppResult<()>;
}

/// Brute-force cosine search over embeddings stored as little-endian f32 BLOBs.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) the store at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Database(format!("Failed to open SQLite index: {}", e)))?;

        tracing::debug!("Opened vector store at {:?}", db_path);
        Self::init(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("Failed to open SQLite index: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                position INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
            "#,
        )
        .map_err(|e| AppError::Database(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Database("Vector store lock poisoned".to_string()))
    }
}

impl VectorStore for SqliteVectorStore {
    fn add(&self, chunks: &[DocumentChunk]) -> AppResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let created_at = Utc::now().to_rfc3339();
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO chunks (id, source, position, content, embedding, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| AppError::Database(format!("Failed to prepare insert: {}", e)))?;

            for chunk in chunks {
                stmt.execute(params![
                    chunk.id,
                    chunk.source,
                    chunk.position as i64,
                    chunk.content,
                    embedding_to_bytes(&chunk.embedding),
                    created_at,
                ])
                .map_err(|e| AppError::Database(format!("Failed to insert chunk: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Database(format!("Failed to commit chunks: {}", e)))?;

        Ok(chunks.len())
    }

    fn search(&self, embedding: &[f32], k: usize) -> AppResult<Vec<RetrievedDocument>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT source, content, embedding FROM chunks")
            .map_err(|e| AppError::Database(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let source: String = row.get(0)?;
                let content: String = row.get(1)?;
                let bytes: Vec<u8> = row.get(2)?;
                Ok((source, content, bytes))
            })
            .map_err(|e| AppError::Database(format!("Failed to query chunks: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            let (source, content, bytes) =
                row.map_err(|e| AppError::Database(format!("Failed to read chunk: {}", e)))?;
            let stored = bytes_to_embedding(&bytes)?;
            results.push(RetrievedDocument {
                source,
                content,
                score: cosine_similarity(embedding, &stored),
            });
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        tracing::debug!("Retrieved {} chunks (requested top-{})", results.len(), k);
        Ok(results)
    }

    fn delete_source(&self, source: &str) -> AppResult<usize> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM chunks WHERE source = ?1", params![source])
            .map_err(|e| AppError::Database(format!("Failed to delete chunks: {}", e)))
    }

    fn count(&self) -> AppResult<usize> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(|e| AppError::Database(format!("Failed to count chunks: {}", e)))
    }

    fn sources(&self) -> AppResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT source FROM chunks ORDER BY source")
            .map_err(|e| AppError::Database(format!("Failed to prepare query: {}", e)))?;

        let sources = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| AppError::Database(format!("Failed to list sources: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("Failed to list sources: {}", e)))?;

        Ok(sources)
    }

    fn reset(&self) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM chunks", [])
            .map_err(|e| AppError::Database(format!("Failed to delete chunks: {}", e)))?;

        tracing::info!("Reset vector store");
        Ok(())
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity; mismatched lengths and zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
