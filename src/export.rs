//! Export chat history as a plain-text or PDF transcript.
//!
//! Both formats list messages oldest first as `<Role>: <content>`. The PDF
//! is laid out by hand with `lopdf`: US Letter pages, Helvetica 12pt, one
//! wrapped line every 20pt from the top margin down.

use anyhow::{bail, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use std::str::FromStr;

use intellibot_core::models::Message;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const FONT_SIZE: i64 = 12;
const LEFT_MARGIN: i64 = 50;
const TOP_Y: i64 = 750;
const BOTTOM_Y: i64 = 50;
const LEADING: i64 = 20;
/// Characters per line that fit the page at 12pt Helvetica.
const WRAP_COLUMNS: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Txt),
            "pdf" => Ok(ExportFormat::Pdf),
            other => bail!("Unknown export format '{}' (expected txt or pdf)", other),
        }
    }
}

/// Render `history` in `format`.
pub fn render(history: &[Message], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Txt => render_text(history),
        ExportFormat::Pdf => render_pdf(history),
    }
}

/// Render and write `history` to `path`.
pub fn write_export(history: &[Message], format: ExportFormat, path: &Path) -> Result<()> {
    let bytes = render(history, format)?;
    std::fs::write(path, &bytes)?;
    tracing::info!(
        path = %path.display(),
        format = format.extension(),
        messages = history.len(),
        bytes = bytes.len(),
        "history exported"
    );
    Ok(())
}

pub fn render_text(history: &[Message]) -> Result<Vec<u8>> {
    ensure_not_empty(history)?;
    let mut out = String::new();
    for message in history {
        out.push_str(&transcript_entry(message));
        out.push_str("\n\n");
    }
    Ok(out.into_bytes())
}

pub fn render_pdf(history: &[Message]) -> Result<Vec<u8>> {
    ensure_not_empty(history)?;

    let mut lines = Vec::new();
    for message in history {
        for paragraph in transcript_entry(message).lines() {
            lines.extend(wrap(paragraph, WRAP_COLUMNS));
        }
        lines.push(String::new());
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut operations = Vec::new();
    let mut y = TOP_Y;

    for line in &lines {
        if y < BOTTOM_Y {
            page_ids.push(add_page(&mut doc, pages_id, std::mem::take(&mut operations))?);
            y = TOP_Y;
        }
        if !line.is_empty() {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
                Operation::new("Td", vec![LEFT_MARGIN.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(latin1(line))]),
                Operation::new("ET", vec![]),
            ]);
        }
        y -= LEADING;
    }
    page_ids.push(add_page(&mut doc, pages_id, operations)?);

    let count = page_ids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.into_iter().map(Object::from).collect::<Vec<_>>(),
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

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn add_page(doc: &mut Document, pages_id: ObjectId, operations: Vec<Operation>) -> Result<ObjectId> {
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

fn ensure_not_empty(history: &[Message]) -> Result<()> {
    if history.is_empty() {
        bail!("No chat history to export");
    }
    Ok(())
}

fn transcript_entry(message: &Message) -> String {
    format!("{}: {}", message.role.label(), message.content)
}

/// Greedy word wrap on character counts. Words longer than `width` are
/// split hard.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode as Latin-1, replacing anything outside it with `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Message> {
        vec![
            Message::user("What is the refund window?"),
            Message::assistant("Refunds are accepted within 30 days."),
        ]
    }

    #[test]
    fn test_text_transcript() {
        let bytes = render_text(&sample()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "User: What is the refund window?\n\nAssistant: Refunds are accepted within 30 days.\n\n"
        );
    }

    #[test]
    fn test_empty_history_is_error() {
        let err = render_text(&[]).unwrap_err();
        assert_eq!(err.to_string(), "No chat history to export");
        assert!(render_pdf(&[]).is_err());
    }

    #[test]
    fn test_pdf_has_header_and_paginates() {
        let bytes = render_pdf(&sample()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let long: Vec<Message> = (0..60)
            .map(|i| Message::user(format!("question number {}", i)))
            .collect();
        let bytes = render_pdf(&long).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap("abcdefghijkl", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_latin1_replacement() {
        assert_eq!(latin1("café ✓"), vec![b'c', b'a', b'f', 0xe9, b' ', b'?']);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
        assert!("docx".parse::<ExportFormat>().is_err());
    }
}
