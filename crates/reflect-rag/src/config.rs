//! Configuration for the reflection pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectConfig {
    /// Language model configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Retrieval policy
    pub retrieval: RetrievalConfig,
    /// Chunking configuration (ingestion)
    pub chunking: ChunkingConfig,
    /// Server configuration
    pub server: ServerConfig,
}

impl ReflectConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read config {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing sections fall back to defaults
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("REFLECT_LLM_BACKEND") {
            match backend.trim().to_lowercase().as_str() {
                "groq" => self.llm.backend = LlmBackend::Groq,
                "ollama" => self.llm.backend = LlmBackend::Ollama,
                other => tracing::warn!("Ignoring unknown REFLECT_LLM_BACKEND '{}'", other),
            }
        }
        if let Some(key) = lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("REFLECT_LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.model = Some(model);
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.embeddings.base_url = url.clone();
            if self.llm.backend == LlmBackend::Ollama {
                self.llm.base_url = Some(url);
            }
        }
        if let Some(backend) = lookup("REFLECT_VECTOR_BACKEND") {
            match backend.trim().to_lowercase().as_str() {
                "local" => self.vector_db.backend = VectorBackend::Local,
                "chroma" => self.vector_db.backend = VectorBackend::Chroma,
                other => tracing::warn!("Ignoring unknown REFLECT_VECTOR_BACKEND '{}'", other),
            }
        }
        if let Some(path) = lookup("REFLECT_STORE_PATH") {
            self.vector_db.storage_path = PathBuf::from(path);
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.llm.backend == LlmBackend::Groq && self.llm.api_key.is_none() {
            return Err(Error::Config(
                "Groq backend selected but no API key configured (set GROQ_API_KEY)".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        Ok(())
    }
}

/// Language model backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Groq hosted OpenAI-compatible endpoint
    Groq,
}

impl LlmBackend {
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmBackend::Ollama => "http://localhost:11434",
            LlmBackend::Groq => "https://api.groq.com/openai/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            LlmBackend::Ollama => "llama3.2:3b",
            LlmBackend::Groq => "llama-3.3-70b-versatile",
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which backend answers prompts
    pub backend: LlmBackend,
    /// Backend base URL; unset means the backend's default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Generation model name; unset means the backend's default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key (Groq only)
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for failed transport requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: None,
            model: None,
            api_key: None,
            temperature: 0.0, // Deterministic critiques
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

impl LlmConfig {
    /// Configured base URL, or the selected backend's default
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
    }

    /// Configured model, or the selected backend's default
    pub fn resolved_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL used for embeddings
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
        }
    }
}

/// Vector index backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// JSON-persisted in-process index
    #[default]
    Local,
    /// Chroma server over REST
    Chroma,
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Which index serves retrieval
    pub backend: VectorBackend,
    /// Storage file for the local index
    pub storage_path: PathBuf,
    /// Chroma server URL
    pub chroma_url: String,
    /// Chroma collection name
    pub collection: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        let storage_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reflect-rag")
            .join("index.json");

        Self {
            backend: VectorBackend::Local,
            storage_path,
            chroma_url: "http://localhost:8000".to_string(),
            collection: "reflect_kb".to_string(),
        }
    }
}

/// Retrieval policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks per retrieval
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
            min_chunk_size: 20,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}
