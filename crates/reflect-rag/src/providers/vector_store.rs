//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::Chunk;

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Similarity score (higher is more similar)
    pub similarity: f32,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `LocalVectorStore`: JSON-persisted in-process index
/// - `ChromaVectorStore`: Chroma server over REST
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert embedded chunks
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` most similar chunks, best first
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Dimension of the stored embeddings, if the index knows it
    async fn dimensions(&self) -> Result<Option<usize>> {
        Ok(None)
    }

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Flush pending writes; called once at shutdown
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
