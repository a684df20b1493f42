//! Sentence-aware text chunking with overlap

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Document};

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap carried from the end of one chunk into the next
    overlap: usize,
    /// Chunks shorter than this are dropped
    min_size: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_size: 20,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            min_size: config.min_chunk_size,
        }
    }

    /// Chunk a document's extracted text
    pub fn chunk_document(&self, doc: &Document, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::new(doc, content, i as u32))
            .collect()
    }

    /// Split text into trimmed chunks of at most roughly `chunk_size` bytes
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for piece in self.pieces(text) {
            if !current.is_empty() && current.len() + piece.len() > self.chunk_size {
                self.push_chunk(&mut chunks, &current);
                current = self.get_overlap_text(&current);
            }
            current.push_str(piece);
        }

        self.push_chunk(&mut chunks, &current);
        chunks
    }

    fn push_chunk(&self, chunks: &mut Vec<String>, text: &str) {
        let trimmed = text.trim();
        if trimmed.len() >= self.min_size {
            chunks.push(trimmed.to_string());
        }
    }

    /// Sentences, with any sentence longer than a chunk cut on word bounds
    fn pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        for sentence in text.split_sentence_bounds() {
            if sentence.len() <= self.chunk_size {
                pieces.push(sentence);
                continue;
            }

            let mut start = 0;
            let mut len = 0;
            for (offset, word) in sentence.split_word_bound_indices() {
                if len > 0 && len + word.len() > self.chunk_size {
                    pieces.push(&sentence[start..offset]);
                    start = offset;
                    len = 0;
                }
                len += word.len();
            }
            if start < sentence.len() {
                pieces.push(&sentence[start..]);
            }
        }
        pieces
    }

    /// Get overlap text from the end of a chunk
    fn get_overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len().saturating_sub(self.overlap);
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }

        let overlap_text = &text[start..];

        // Prefer starting at a sentence, then a word
        if let Some(pos) = overlap_text.find(". ") {
            return overlap_text[pos + 2..].to_string();
        }
        if let Some(pos) = overlap_text.find(' ') {
            return overlap_text[pos + 1..].to_string();
        }

        overlap_text.to_string()
    }
}
