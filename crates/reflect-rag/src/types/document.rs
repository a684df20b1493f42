//! Source documents and the chunks stored in the vector index

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File types accepted by ingestion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Anything else (skipped)
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a file name
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// A loaded source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename
    pub filename: String,
    /// Detected file type
    pub file_type: FileType,
    /// SHA-256 of the extracted text
    pub content_hash: String,
}

impl Document {
    /// Create a new document record
    pub fn new(filename: impl Into<String>, file_type: FileType, content_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            file_type,
            content_hash,
        }
    }
}

/// A bounded slice of a document, stored with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Source filename
    pub source: String,
    /// Chunk text
    pub content: String,
    /// Position of the chunk within its document
    pub chunk_index: u32,
    /// Embedding vector (empty until embedded)
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a chunk without an embedding
    pub fn new(document: &Document, content: String, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            source: document.filename.clone(),
            content,
            chunk_index,
            embedding: Vec::new(),
        }
    }

    /// Attach an embedding
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}
