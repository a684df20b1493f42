//! Text extraction for knowledge-base files (.txt, .md, .pdf)

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Extracted text of one source file
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// SHA-256 of `content`, hex encoded
    pub content_hash: String,
    /// Page count for PDFs
    pub total_pages: Option<u32>,
}

/// File parser keyed on extension
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename);

        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Txt | FileType::Markdown => Ok(Self::parse_text(data, file_type)),
            FileType::Unknown => Err(Error::UnsupportedFileType(filename.to_string())),
        }
    }

    fn parse_text(data: &[u8], file_type: FileType) -> ParsedDocument {
        let content = String::from_utf8_lossy(data).into_owned();
        ParsedDocument {
            file_type,
            content_hash: hash_content(&content),
            content,
            total_pages: None,
        }
    }

    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let raw = Self::extract_pdf_text(filename, data)?;

        let content = normalize_pdf_text(&raw)
            .replace('\0', "")
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return Err(Error::file_parse(filename, "No text content could be extracted from PDF"));
        }

        let total_pages = lopdf::Document::load_mem(data)
            .map(|doc| doc.get_pages().len() as u32)
            .ok();

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content_hash: hash_content(&content),
            content,
            total_pages,
        })
    }

    #[cfg(feature = "pdf")]
    fn extract_pdf_text(filename: &str, data: &[u8]) -> Result<String> {
        match pdf_extract::extract_text_from_mem(data) {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                tracing::warn!(file = %filename, "pdf-extract found no text, trying fallback");
                Self::extract_pdf_text_fallback(filename, data)
            }
            Err(e) => {
                tracing::warn!(file = %filename, "pdf-extract failed: {}, trying fallback", e);
                Self::extract_pdf_text_fallback(filename, data)
            }
        }
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_pdf_text(filename: &str, data: &[u8]) -> Result<String> {
        Self::extract_pdf_text_fallback(filename, data)
    }

    /// Fallback PDF text extraction using lopdf directly
    fn extract_pdf_text_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut all_text = String::new();
        for (page_num, page_id) in doc.get_pages() {
            match doc.get_page_content(page_id) {
                Ok(content) => {
                    let text = extract_text_from_content(&content);
                    if !text.is_empty() {
                        all_text.push_str(&text);
                        all_text.push('\n');
                    }
                }
                Err(e) => {
                    tracing::debug!("Could not get content for page {}: {}", page_num, e);
                }
            }
        }

        if all_text.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "PDF appears to be image-based or has no extractable text",
            ));
        }
        Ok(all_text)
    }
}

/// Pull string operands of `Tj`/`TJ` operators out of a content stream
fn extract_text_from_content(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content_str.lines() {
        let line = line.trim();
        match line {
            "BT" => in_text_block = true,
            "ET" => {
                in_text_block = false;
                text.push(' ');
            }
            _ if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) => {
                if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
                    if start < end {
                        text.push_str(
                            &line[start + 1..end]
                                .replace("\\(", "(")
                                .replace("\\)", ")")
                                .replace("\\\\", "\\"),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    text.trim().to_string()
}

/// Replace typographic glyphs PDFs commonly emit with ASCII
fn normalize_pdf_text(text: &str) -> String {
    text.replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
}

/// Hash content for deduplication
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_and_markdown() {
        let parsed = FileParser::parse("notes.md", b"# Bias\nHigh bias underfits.").unwrap();
        assert_eq!(parsed.file_type, FileType::Markdown);
        assert_eq!(parsed.content, "# Bias\nHigh bias underfits.");
        assert_eq!(parsed.content_hash.len(), 64);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FileParser::parse("image.png", b"\x89PNG").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(name) if name == "image.png"));
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abd"));
    }

    #[test]
    fn test_content_stream_text() {
        let stream = b"BT\n/F1 12 Tf\n100 700 Td\n(Hello \\(world\\)) Tj\nET\n";
        assert_eq!(extract_text_from_content(stream), "Hello (world)");
    }

    #[test]
    fn test_garbage_pdf_is_a_parse_error() {
        let err = FileParser::parse("broken.pdf", b"not a pdf").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
