//! Knowledge-base ingestion: load .txt/.md/.pdf files, chunk, embed, index

mod chunker;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use parser::{hash_content, FileParser, ParsedDocument};
pub use processor::{IngestPipeline, IngestReport};
