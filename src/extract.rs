//! Plain-text extraction for uploaded documents.
//!
//! PDFs go through `pdf-extract`; everything else is read as UTF-8 text.
//! Extraction never panics: every failure is an [`ExtractError`] and the
//! caller decides whether to keep the previously loaded document.

use std::path::Path;

use intellibot_core::models::Document;
use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Largest file accepted for extraction.
pub const MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: String, size: u64, limit: u64 },
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("document is not valid UTF-8 text")]
    NotUtf8,
}

/// Guess the content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => MIME_PDF,
        _ => MIME_TEXT,
    }
}

/// Extract plain text from raw bytes of the given content type.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    match content_type {
        MIME_PDF => extract_pdf(bytes),
        MIME_TEXT => String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::NotUtf8),
        _ => Err(ExtractError::UnsupportedContentType(
            content_type.to_string(),
        )),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract can panic on malformed input.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(result) => result.map_err(|e| ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf(
            "parser panicked on malformed input".to_string(),
        )),
    }
}

/// Read and extract a file into a [`Document`] named after the file.
pub fn load_document(path: &Path) -> Result<Document, ExtractError> {
    let display = path.display().to_string();
    let io_err = |source| ExtractError::Io {
        path: display.clone(),
        source,
    };

    let size = std::fs::metadata(path).map_err(io_err)?.len();
    if size > MAX_DOCUMENT_BYTES {
        return Err(ExtractError::TooLarge {
            path: display,
            size,
            limit: MAX_DOCUMENT_BYTES,
        });
    }

    let bytes = std::fs::read(path).map_err(io_err)?;
    let content_type = content_type_for(path);
    let text = extract_text(&bytes, content_type)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| display.clone());

    tracing::debug!(
        path = %path.display(),
        content_type,
        bytes = bytes.len(),
        chars = text.chars().count(),
        "extracted document"
    );

    Ok(Document::new(name, text))
}
