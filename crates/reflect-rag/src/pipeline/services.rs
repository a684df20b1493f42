//! Per-process service handles injected into the loop

use serde::Serialize;
use std::sync::Arc;

use crate::config::{LlmBackend, ReflectConfig, VectorBackend};
use crate::error::Result;
use crate::providers::{
    chroma::ChromaVectorStore,
    groq::GroqLlm,
    local::LocalVectorStore,
    ollama::{OllamaEmbedder, OllamaLlm},
    EmbeddingProvider, LlmProvider, VectorStoreProvider,
};

/// Shared model client, embedder and vector index handle.
///
/// Built once per process with [`Services::from_config`] and cloned freely;
/// call [`Services::shutdown`] before exit.
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmProvider>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub vector_store: Arc<dyn VectorStoreProvider>,
}

/// Reachability of each external service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub llm: bool,
    pub embedder: bool,
    pub vector_store: bool,
}

impl ServiceHealth {
    pub fn all_healthy(&self) -> bool {
        self.llm && self.embedder && self.vector_store
    }
}

impl Services {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            llm,
            embedder,
            vector_store,
        }
    }

    /// Initialize providers selected by the configuration
    pub fn from_config(config: &ReflectConfig) -> Result<Self> {
        let llm: Arc<dyn LlmProvider> = match config.llm.backend {
            LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm)?),
            LlmBackend::Groq => Arc::new(GroqLlm::new(&config.llm)?),
        };

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(
            &config.embeddings,
            config.llm.timeout_secs,
            config.llm.max_retries,
        )?);

        let vector_store: Arc<dyn VectorStoreProvider> = match config.vector_db.backend {
            VectorBackend::Local => {
                Arc::new(LocalVectorStore::open(&config.vector_db.storage_path)?)
            }
            VectorBackend::Chroma => Arc::new(ChromaVectorStore::new(&config.vector_db)?),
        };

        tracing::info!(
            llm = llm.name(),
            model = llm.model(),
            embedder = embedder.name(),
            vector_store = vector_store.name(),
            "Services initialized"
        );

        Ok(Self::new(llm, embedder, vector_store))
    }

    pub async fn health(&self) -> ServiceHealth {
        let (llm, embedder, vector_store) = tokio::join!(
            self.llm.health_check(),
            self.embedder.health_check(),
            self.vector_store.health_check(),
        );
        ServiceHealth {
            llm: llm.unwrap_or(false),
            embedder: embedder.unwrap_or(false),
            vector_store: vector_store.unwrap_or(false),
        }
    }

    /// Teardown hook: persist pending index writes
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!(vector_store = self.vector_store.name(), "Shutting down services");
        self.vector_store.flush().await
    }
}
