//! Chroma vector store over its REST API
//!
//! Talks to a running Chroma server directly with reqwest. The collection is
//! created on first use (cosine space) and its ID cached for the process.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::Chunk;

use super::http_client;
use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Chroma collection info returned by the API
#[derive(Debug, Clone, Deserialize)]
struct CollectionInfo {
    id: String,
}

/// Result from a query operation
#[derive(Debug, Clone, Deserialize)]
struct QueryResult {
    ids: Vec<Vec<String>>,
    documents: Option<Vec<Vec<Option<String>>>>,
    metadatas: Option<Vec<Vec<Option<Value>>>>,
    distances: Option<Vec<Vec<f32>>>,
}

/// Chroma-backed vector store
pub struct ChromaVectorStore {
    http: Client,
    base_url: String,
    collection: String,
    collection_id: OnceCell<String>,
}

impl ChromaVectorStore {
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(30)?,
            base_url: config.chroma_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            collection_id: OnceCell::new(),
        })
    }

    /// Resolve (creating if needed) the collection ID
    async fn collection_id(&self) -> Result<&str> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let body = json!({
                    "name": self.collection,
                    "get_or_create": true,
                    "metadata": { "hnsw:space": "cosine" },
                });

                let resp = self
                    .http
                    .post(format!("{}/api/v1/collections", self.base_url))
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| Error::vector_db(format!("Chroma unreachable: {}", e)))?;

                let status = resp.status();
                let text = resp.text().await?;
                if !status.is_success() {
                    return Err(Error::vector_db(format!(
                        "Create collection '{}' failed ({}): {}",
                        self.collection, status, text
                    )));
                }

                let info: CollectionInfo = serde_json::from_str(&text)
                    .map_err(|e| Error::vector_db(format!("{}: {}", e, text)))?;
                tracing::info!(
                    collection = %self.collection,
                    id = %info.id,
                    "Chroma collection ready"
                );
                Ok::<_, Error>(info.id)
            })
            .await?;
        Ok(id.as_str())
    }
}

#[async_trait]
impl VectorStoreProvider for ChromaVectorStore {
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let collection_id = self.collection_id().await?;

        let body = json!({
            "ids": chunks.iter().map(|c| c.id.to_string()).collect::<Vec<_>>(),
            "embeddings": chunks.iter().map(|c| c.embedding.clone()).collect::<Vec<_>>(),
            "documents": chunks.iter().map(|c| c.content.clone()).collect::<Vec<_>>(),
            "metadatas": chunks.iter().map(|c| json!({
                "document_id": c.document_id.to_string(),
                "source": c.source,
                "chunk_index": c.chunk_index,
            })).collect::<Vec<_>>(),
        });

        let resp = self
            .http
            .post(format!("{}/api/v1/collections/{}/add", self.base_url, collection_id))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %text, "Chroma add failed");
            return Err(Error::vector_db(format!("Add failed ({}): {}", status, text)));
        }

        tracing::info!(collection = %self.collection, count = chunks.len(), "Added chunks");
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let collection_id = self.collection_id().await?;

        let body = json!({
            "query_embeddings": [query_embedding],
            "n_results": top_k,
            "include": ["documents", "metadatas", "distances"],
        });

        let resp = self
            .http
            .post(format!("{}/api/v1/collections/{}/query", self.base_url, collection_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Chroma query failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!("Query failed ({}): {}", status, text)));
        }

        let result: QueryResult = resp
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Bad query response: {}", e)))?;

        Ok(into_search_results(result))
    }

    async fn len(&self) -> Result<usize> {
        let collection_id = self.collection_id().await?;
        let resp = self
            .http
            .get(format!("{}/api/v1/collections/{}/count", self.base_url, collection_id))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::vector_db(format!("Count failed: {}", resp.status())));
        }
        Ok(resp.json::<usize>().await?)
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .http
            .get(format!("{}/api/v1/heartbeat", self.base_url))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "chroma"
    }
}

/// Flatten the single-query response into ordered search results
fn into_search_results(result: QueryResult) -> Vec<VectorSearchResult> {
    let ids = result.ids.into_iter().next().unwrap_or_default();
    let documents = result
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();
    let metadatas = result
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default();
    let distances = result
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();

    ids.into_iter()
        .enumerate()
        .filter_map(|(i, id)| {
            let content = documents.get(i).cloned().flatten()?;
            let metadata = metadatas.get(i).cloned().flatten().unwrap_or(Value::Null);
            let distance = distances.get(i).copied().unwrap_or(1.0);

            Some(VectorSearchResult {
                chunk: Chunk {
                    id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::new_v4()),
                    document_id: metadata["document_id"]
                        .as_str()
                        .and_then(|s| Uuid::parse_str(s).ok())
                        .unwrap_or_else(Uuid::nil),
                    source: metadata["source"].as_str().unwrap_or("unknown").to_string(),
                    content,
                    chunk_index: metadata["chunk_index"].as_u64().unwrap_or(0) as u32,
                    embedding: Vec::new(),
                },
                similarity: 1.0 - distance,
            })
        })
        .collect()
}
