//! Fixed top-k retrieval over the vector index

use serde::Serialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};

/// Ordered chunk texts retrieved for one query variant
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextBundle {
    chunks: Vec<String>,
}

impl ContextBundle {
    pub fn new(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    /// Chunk texts joined with newlines, as rendered into prompts
    pub fn joined(&self) -> String {
        self.chunks.join("\n")
    }

    /// First `max_chars` characters of the joined context
    pub fn preview(&self, max_chars: usize) -> String {
        self.joined().chars().take(max_chars).collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }
}

/// Embeds a query and pulls the `top_k` nearest chunks from the index
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve context for a query.
    ///
    /// An index that returns nothing is an error: the loop must not run on
    /// empty context. So is a query vector that cannot be compared against
    /// the index.
    pub async fn retrieve(&self, query: &str) -> Result<ContextBundle> {
        let embedding = self.embedder.embed(query).await?;
        self.check_dimensions(&embedding).await?;

        let results = self.store.search(&embedding, self.top_k).await?;

        if results.is_empty() {
            tracing::warn!(
                query = %query,
                store = self.store.name(),
                "Retrieval returned no chunks"
            );
            return Err(Error::EmptyContext(query.to_string()));
        }

        tracing::info!(
            query = %query,
            hits = results.len(),
            best = results[0].similarity,
            "Retrieved context"
        );

        Ok(ContextBundle::new(
            results.into_iter().map(|r| r.chunk.content).collect(),
        ))
    }

    async fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::embedding(format!(
                "{} returned an empty embedding",
                self.embedder.name()
            )));
        }
        if embedding.len() != self.embedder.dimensions() {
            return Err(Error::embedding(format!(
                "{} returned {} dimensions, configured for {}",
                self.embedder.name(),
                embedding.len(),
                self.embedder.dimensions()
            )));
        }
        if let Some(indexed) = self.store.dimensions().await? {
            if indexed != embedding.len() {
                return Err(Error::vector_db(format!(
                    "Index {} holds {}-dimensional embeddings but queries are {}-dimensional; re-ingest after changing the embedding model",
                    self.store.name(),
                    indexed,
                    embedding.len()
                )));
            }
        }
        Ok(())
    }
}
