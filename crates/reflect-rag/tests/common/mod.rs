//! Scripted in-memory providers for driving the loop without network access

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use reflect_rag::providers::{
    EmbeddingProvider, LlmProvider, VectorSearchResult, VectorStoreProvider,
};
use reflect_rag::types::{Chunk, Document, FileType};
use reflect_rag::{Error, Result, Services};

/// Returns queued completions in call order and records every prompt
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Queue a transport failure after the current script
    pub fn push_failure(&self, message: &str) {
        self.responses.lock().push_back(Err(Error::llm(message)));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::llm("script exhausted")))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Constant embedder that records which texts it was asked to embed
#[derive(Default)]
pub struct RecordingEmbedder {
    texts: Mutex<Vec<String>>,
}

impl RecordingEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for RecordingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.texts.lock().push(text.to_string());
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Returns the same chunks for every query
pub struct FixedStore {
    chunks: Vec<Chunk>,
}

impl FixedStore {
    pub fn new(texts: &[&str]) -> Arc<Self> {
        let doc = Document::new("kb.txt", FileType::Txt, "fixture".to_string());
        Arc::new(Self {
            chunks: texts
                .iter()
                .enumerate()
                .map(|(i, t)| Chunk::new(&doc, t.to_string(), i as u32))
                .collect(),
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self { chunks: Vec::new() })
    }
}

#[async_trait]
impl VectorStoreProvider for FixedStore {
    async fn insert_chunks(&self, _chunks: &[Chunk]) -> Result<()> {
        Err(Error::vector_db("fixture store is read-only"))
    }

    async fn search(&self, _query: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        Ok(self
            .chunks
            .iter()
            .take(top_k)
            .map(|chunk| VectorSearchResult {
                chunk: chunk.clone(),
                similarity: 1.0,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.chunks.len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

pub fn services(
    llm: Arc<ScriptedLlm>,
    embedder: Arc<RecordingEmbedder>,
    store: Arc<FixedStore>,
) -> Services {
    Services::new(llm, embedder, store)
}

pub const DEV_GOOD: &str = r#"{"relevance": 9, "issues": [], "action": "good"}"#;
pub const DEV_REFINE: &str = r#"{"relevance": 5, "issues": ["too vague"], "action": "refine"}"#;
