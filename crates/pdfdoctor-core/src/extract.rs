//! Plain-text extraction.

use std::path::{Path, PathBuf};

use lopdf::Document;

use crate::content::{page_text, scan_page};
use crate::document::{open_document, page_ids, write_atomic};
use crate::error::Result;
use crate::outpath::{resolve_output, OutputKind};

/// Extract the text of every page, in page order, separated by a blank line,
/// and write it as UTF-8 to the output path (default: `.txt` next to the
/// input).
pub fn extract_text(path: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    let doc = open_document(path)?;
    let out = resolve_output(path, output, OutputKind::PlainText);

    let mut text = document_text(&doc)?;
    if text.trim().is_empty() {
        // The native scan found nothing; fall back to the pdf-extract
        // backend, which handles embedded-font encodings the scanner
        // does not.
        if let Ok(fallback) = pdf_extract::extract_text(path) {
            if !fallback.trim().is_empty() {
                text = fallback;
            }
        }
    }

    write_atomic(&out, text.as_bytes())?;
    tracing::info!(path = %out.display(), bytes = text.len(), "extracted text");
    Ok(out)
}

/// Concatenate every page's text with a blank line after each page.
pub fn document_text(doc: &Document) -> Result<String> {
    let mut text = String::new();
    for page_id in page_ids(doc) {
        let (_, runs) = scan_page(doc, page_id)?;
        text.push_str(&page_text(&runs));
        text.push_str("\n\n");
    }
    Ok(text)
}
