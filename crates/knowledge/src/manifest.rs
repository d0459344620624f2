//! Record of indexed files for incremental indexing.

use agentic_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Manifest entry for one indexed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFile {
    /// SHA-256 of the file contents, lowercase hex
    pub hash: String,

    /// RFC 3339 timestamp of the last indexing
    pub modified_at: String,

    pub indexed: bool,

    pub chunk_count: usize,
}

/// Map from file path to what was indexed for it, persisted as pretty JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexManifest {
    files: BTreeMap<String, IndexedFile>,
}

impl IndexManifest {
    /// Load the manifest; a missing file is an empty manifest.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            AppError::Knowledge(format!("Failed to parse manifest {:?}: {}", path, e))
        })
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        tracing::debug!("Saved manifest with {} entries to {:?}", self.len(), path);
        Ok(())
    }

    /// True when the file is new, its hash changed, or it was never fully indexed.
    pub fn needs_indexing(&self, path: &str, hash: &str) -> bool {
        match self.files.get(path) {
            Some(entry) => !entry.indexed || entry.hash != hash,
            None => true,
        }
    }

    pub fn get(&self, path: &str) -> Option<&IndexedFile> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn record(&mut self, path: impl Into<String>, entry: IndexedFile) {
        self.files.insert(path.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(hash: &str, indexed: bool) -> IndexedFile {
        IndexedFile {
            hash: hash.to_string(),
            modified_at: "2024-01-01T00:00:00+00:00".to_string(),
            indexed,
            chunk_count: 2,
        }
    }

    #[test]
    fn test_missing_manifest_is_empty() {
        let temp = TempDir::new().unwrap();
        let manifest = IndexManifest::load(&temp.path().join("indexed_files.json")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_needs_indexing() {
        let mut manifest = IndexManifest::default();
        assert!(manifest.needs_indexing("docs/a.txt", "abc"));

        manifest.record("docs/a.txt", entry("abc", true));
        assert!(!manifest.needs_indexing("docs/a.txt", "abc"));
        assert!(manifest.needs_indexing("docs/a.txt", "def"));

        manifest.record("docs/b.txt", entry("abc", false));
        assert!(manifest.needs_indexing("docs/b.txt", "abc"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("indexed_files.json");

        let mut manifest = IndexManifest::default();
        manifest.record("docs/a.txt", entry("abc", true));
        manifest.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["docs/a.txt"]["hash"], "abc");
        assert_eq!(json["docs/a.txt"]["chunk_count"], 2);

        let loaded = IndexManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_corrupt_manifest_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("indexed_files.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(IndexManifest::load(&path).is_err());
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_ne!(content_hash(b"hello"), content_hash(b"hello!"));
    }
}
