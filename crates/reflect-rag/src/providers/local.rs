//! Local vector index persisted as a JSON file
//!
//! Brute-force cosine search over every stored chunk. Suited to the small
//! knowledge bases the reviewer is fed (a handful of text/PDF files).

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    chunks: Vec<Chunk>,
}

/// In-process vector index with optional file persistence
pub struct LocalVectorStore {
    /// Backing file; `None` keeps the index in memory only
    path: Option<PathBuf>,
    chunks: Arc<RwLock<Vec<Chunk>>>,
    dirty: AtomicBool,
}

impl LocalVectorStore {
    /// Open (or start) the index stored at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let chunks = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let file: IndexFile = serde_json::from_str(&raw).map_err(|e| {
                Error::vector_db(format!("Corrupt index file {}: {}", path.display(), e))
            })?;
            if file.version != INDEX_FORMAT_VERSION {
                return Err(Error::vector_db(format!(
                    "Unsupported index version {} in {}",
                    file.version,
                    path.display()
                )));
            }
            file.chunks
        } else {
            Vec::new()
        };

        tracing::info!("Local index opened at {} ({} chunks)", path.display(), chunks.len());

        Ok(Self {
            path: Some(path),
            chunks: Arc::new(RwLock::new(chunks)),
            dirty: AtomicBool::new(false),
        })
    }

    /// Create an index that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            chunks: Arc::new(RwLock::new(Vec::new())),
            dirty: AtomicBool::new(false),
        }
    }

    /// Write the index to its backing file (write-then-rename)
    fn persist(path: &Path, chunks: &[Chunk]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            chunks: chunks.to_vec(),
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&file)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        if let Some(chunk) = chunks.iter().find(|c| c.embedding.is_empty()) {
            return Err(Error::vector_db(format!("Chunk {} has no embedding", chunk.id)));
        }

        let mut stored = self.chunks.write();
        if let Some(expected) = stored.first().map(|c| c.embedding.len()) {
            if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != expected) {
                return Err(Error::vector_db(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    expected,
                    bad.embedding.len()
                )));
            }
        }
        stored.extend_from_slice(chunks);
        self.dirty.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        if query_embedding.is_empty() {
            return Err(Error::vector_db("Query embedding is empty"));
        }
        let indexed = self.chunks.read().first().map(|c| c.embedding.len());
        if let Some(expected) = indexed {
            if query_embedding.len() != expected {
                return Err(Error::vector_db(format!(
                    "Query embedding dimension mismatch: index has {}, query has {}",
                    expected,
                    query_embedding.len()
                )));
            }
        }

        let chunks = Arc::clone(&self.chunks);
        let query = query_embedding.to_vec();

        tokio::task::spawn_blocking(move || {
            let stored = chunks.read();
            let mut results: Vec<VectorSearchResult> = stored
                .iter()
                .map(|chunk| VectorSearchResult {
                    similarity: cosine_similarity(&query, &chunk.embedding),
                    chunk: chunk.clone(),
                })
                .collect();

            results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
            results.truncate(top_k);
            results
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.chunks.read().len())
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        Ok(self.chunks.read().first().map(|c| c.embedding.len()))
    }

    async fn flush(&self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let snapshot = self.chunks.read().clone();
        let count = snapshot.len();
        let target = path.clone();
        let written = tokio::task::spawn_blocking(move || Self::persist(&target, &snapshot))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?;

        if let Err(e) = written {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }

        tracing::info!("Persisted {} chunks to {}", count, path.display());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "local-json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, FileType};

    fn chunk(doc: &Document, text: &str, embedding: Vec<f32>) -> Chunk {
        Chunk::new(doc, text.to_string(), 0).with_embedding(embedding)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = LocalVectorStore::in_memory();
        let doc = Document::new("notes.txt", FileType::Txt, "h".to_string());
        store
            .insert_chunks(&[
                chunk(&doc, "far", vec![0.0, 1.0]),
                chunk(&doc, "near", vec![1.0, 0.1]),
                chunk(&doc, "middle", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(texts, vec!["near", "middle"]);
    }

    #[tokio::test]
    async fn test_rejects_unembedded_and_mismatched_chunks() {
        let store = LocalVectorStore::in_memory();
        let doc = Document::new("notes.txt", FileType::Txt, "h".to_string());

        assert!(store.insert_chunks(&[chunk(&doc, "x", vec![])]).await.is_err());

        store.insert_chunks(&[chunk(&doc, "a", vec![1.0, 0.0])]).await.unwrap();
        assert!(store
            .insert_chunks(&[chunk(&doc, "b", vec![1.0, 0.0, 0.0])])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_search_rejects_empty_and_mismatched_query() {
        let store = LocalVectorStore::in_memory();
        let doc = Document::new("notes.txt", FileType::Txt, "h".to_string());
        store
            .insert_chunks(&[chunk(&doc, "stored", vec![0.25; 768])])
            .await
            .unwrap();

        let err = store.search(&[1.0, 0.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(err, Error::VectorDb(msg) if msg.contains("768")));
        assert!(matches!(store.search(&[], 5).await, Err(Error::VectorDb(_))));
        assert_eq!(store.dimensions().await.unwrap(), Some(768));
    }

    #[tokio::test]
    async fn test_flush_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb").join("index.json");
        let doc = Document::new("notes.txt", FileType::Txt, "h".to_string());

        let store = LocalVectorStore::open(&path).unwrap();
        store
            .insert_chunks(&[chunk(&doc, "persisted", vec![0.5, 0.5])])
            .await
            .unwrap();
        store.flush().await.unwrap();

        let reopened = LocalVectorStore::open(&path).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);
        let results = reopened.search(&[0.5, 0.5], 5).await.unwrap();
        assert_eq!(results[0].chunk.content, "persisted");
    }
}
