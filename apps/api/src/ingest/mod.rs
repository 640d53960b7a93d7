//! Document Loader: turns an uploaded resume PDF into plain text.
//!
//! Extraction is CPU-bound and the underlying parser may panic on malformed
//! input, so it always runs on the blocking pool where a panic surfaces as a
//! join error instead of taking the worker down.

pub mod chunker;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

/// Every page's text is followed by this separator.
pub const PAGE_SEPARATOR: &str = "\n";

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("file is not a PDF document")]
    NotPdf,

    #[error("PDF could not be parsed: {0}")]
    Parse(String),

    #[error("PDF contains no extractable text")]
    NoText,

    #[error("PDF parser crashed while reading the document")]
    ParserPanicked,
}

/// Cheap format check used both at upload time and before extraction.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    // The header may be preceded by a few junk bytes in files from some producers.
    let window = &bytes[..bytes.len().min(1024)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Extracts the text of every page and joins them, each page followed by
/// [`PAGE_SEPARATOR`].
pub fn extract_text(bytes: &[u8]) -> Result<String, LoaderError> {
    if !looks_like_pdf(bytes) {
        return Err(LoaderError::NotPdf);
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| LoaderError::Parse(e.to_string()))?;
    debug!("Extracted {} pages", pages.len());

    let mut text = String::new();
    for page in &pages {
        text.push_str(page);
        text.push_str(PAGE_SEPARATOR);
    }

    if text.trim().is_empty() {
        return Err(LoaderError::NoText);
    }
    Ok(text)
}

/// Async entry point: runs [`extract_text`] on the blocking pool.
pub async fn load_resume_text(bytes: Bytes) -> Result<String, LoaderError> {
    let text = tokio::task::spawn_blocking(move || extract_text(&bytes))
        .await
        .map_err(|_| LoaderError::ParserPanicked)??;
    info!("Loaded resume text ({} chars)", text.chars().count());
    Ok(text)
}
