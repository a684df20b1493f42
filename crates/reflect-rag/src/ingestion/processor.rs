//! Directory ingestion: parse, chunk, embed, store

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{Document, FileType};

use super::chunker::TextChunker;
use super::parser::FileParser;

/// Summary of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files_loaded: usize,
    /// Unsupported, unreadable or duplicate files
    pub files_skipped: usize,
    pub chunks_created: usize,
}

/// Loads a directory of source files into the vector index
pub struct IngestPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
}

impl IngestPipeline {
    pub fn new(
        chunking: &ChunkingConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            chunker: TextChunker::from_config(chunking),
            embedder,
            store,
        }
    }

    /// Ingest every supported file under `data_dir`, then flush the store
    pub async fn ingest_dir(&self, data_dir: &Path) -> Result<IngestReport> {
        if !data_dir.is_dir() {
            return Err(Error::Config(format!(
                "Data directory not found: {}",
                data_dir.display()
            )));
        }

        let mut report = IngestReport::default();
        let mut seen_hashes = HashSet::new();

        let mut paths: Vec<_> = WalkDir::new(data_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();

        for path in paths {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if !FileType::from_filename(&filename).is_supported() {
                tracing::debug!(file = %filename, "Skipping unsupported file");
                report.files_skipped += 1;
                continue;
            }

            let data = tokio::fs::read(&path).await?;
            let parse_name = filename.clone();
            let parsed = tokio::task::spawn_blocking(move || FileParser::parse(&parse_name, &data))
                .await
                .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?;

            let parsed = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(file = %filename, "Skipping file: {}", e);
                    report.files_skipped += 1;
                    continue;
                }
            };

            if !seen_hashes.insert(parsed.content_hash.clone()) {
                tracing::info!(file = %filename, "Skipping duplicate content");
                report.files_skipped += 1;
                continue;
            }

            let document = Document::new(&filename, parsed.file_type, parsed.content_hash);
            let chunks = self.chunker.chunk_document(&document, &parsed.content);
            if chunks.is_empty() {
                tracing::warn!(file = %filename, "No chunks produced");
                report.files_skipped += 1;
                continue;
            }

            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            let chunks: Vec<_> = chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| chunk.with_embedding(embedding))
                .collect();

            self.store.insert_chunks(&chunks).await?;

            tracing::info!(
                file = %filename,
                pages = ?parsed.total_pages,
                chunks = chunks.len(),
                "Ingested file"
            );
            report.files_loaded += 1;
            report.chunks_created += chunks.len();
        }

        self.store.flush().await?;

        tracing::info!(
            loaded = report.files_loaded,
            skipped = report.files_skipped,
            chunks = report.chunks_created,
            "Ingestion complete"
        );
        Ok(report)
    }
}
