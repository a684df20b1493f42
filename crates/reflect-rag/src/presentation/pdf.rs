//! One-page-per-screenful PDF summary of a recruiter review

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::types::critique::format_number;
use crate::types::PipelineResult;

/// US Letter, points
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN_X: i64 = 100;
const MARGIN_Y: i64 = 60;
/// Approximate Helvetica glyph width used for wrapping
const CHAR_WIDTH: f64 = 6.0;
const MIN_WRAP_COLUMNS: usize = 60;
const QUERY_PREVIEW_CHARS: usize = 80;
const BODY_FONT_SIZE: i64 = 11;
const BODY_LINE_HEIGHT: i64 = 14;

const TITLE: &str = "ReflectCode Review";

/// Render the review PDF, or `None` when the result carries no score
pub fn render_review_pdf(query: &str, result: &PipelineResult) -> Result<Option<Vec<u8>>> {
    let Some(score) = result.score else {
        return Ok(None);
    };

    let mut writer = PageWriter::new();

    writer.text("F2", 14, TITLE);
    writer.advance(20);
    let query_preview: String = query.chars().take(QUERY_PREVIEW_CHARS).collect();
    writer.text("F1", 12, &format!("Query: {}...", query_preview));
    writer.advance(20);
    writer.text("F1", 12, &format!("Score: {}/10", format_number(score)));
    writer.advance(30);

    let body = format!("Final Notes:\n\n{}", result.final_answer);
    for line in body.lines().flat_map(|line| wrap_line(line, wrap_columns())) {
        if writer.y < MARGIN_Y {
            writer.new_page();
        }
        writer.text("F1", BODY_FONT_SIZE, &line);
        writer.advance(BODY_LINE_HEIGHT);
    }

    let bytes = writer.finish()?;
    tracing::debug!(bytes = bytes.len(), "Rendered review PDF");
    Ok(Some(bytes))
}

/// Columns of body text that fit between the side margins
fn wrap_columns() -> usize {
    let usable = (PAGE_WIDTH - 2 * MARGIN_X) as f64;
    MIN_WRAP_COLUMNS.max((usable / CHAR_WIDTH) as usize)
}

/// Greedy word wrap; blank lines produce no output and over-long words are split
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Standard Type1 fonts only cover Latin-1; anything outside ASCII prints as '?'
fn pdf_text(text: &str) -> Object {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| match c {
            '\t' => b' ',
            c if c.is_ascii() && !c.is_ascii_control() => c as u8,
            _ => b'?',
        })
        .collect();
    Object::string_literal(bytes)
}

/// Accumulates text operations page by page
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN_Y,
        }
    }

    fn text(&mut self, font: &str, size: i64, text: &str) {
        let ops = [
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), size.into()]),
            Operation::new("Td", vec![MARGIN_X.into(), self.y.into()]),
            Operation::new("Tj", vec![pdf_text(text)]),
            Operation::new("ET", vec![]),
        ];
        if let Some(page) = self.pages.last_mut() {
            page.extend(ops);
        }
    }

    fn advance(&mut self, points: i64) {
        self.y -= points;
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN_Y;
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let encoded = Content { operations }
                .encode()
                .map_err(|e| Error::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| Error::Pdf(e.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trace;

    fn result(answer: &str, score: Option<f64>) -> PipelineResult {
        PipelineResult {
            final_answer: answer.to_string(),
            steps: Trace::new(),
            score,
        }
    }

    #[test]
    fn test_no_score_no_pdf() {
        assert!(render_review_pdf("q", &result("a", None)).unwrap().is_none());
    }

    #[test]
    fn test_single_page_review() {
        let bytes = render_review_pdf("Review my sort function", &result("Looks solid.", Some(7.0)))
            .unwrap()
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_long_answer_paginates() {
        let answer = (0..120)
            .map(|i| format!("Line {} of the review notes.", i))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = render_review_pdf("q", &result(&answer, Some(0.0))).unwrap().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 3);
    }

    #[test]
    fn test_wrap_line() {
        assert!(wrap_line("", 10).is_empty());
        assert!(wrap_line("   ", 10).is_empty());
        assert_eq!(wrap_line("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap_line("abcdefghij k", 4), vec!["abcd", "efgh", "ij k"]);
    }

    #[test]
    fn test_wrap_columns() {
        assert_eq!(wrap_columns(), 68);
    }
}
