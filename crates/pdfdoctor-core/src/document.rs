//! Document lifetime: open, probe, atomic save.
//!
//! A `lopdf::Document` is owned exclusively by the operation that opened it
//! and is released on every exit path when it drops. Saves are staged in a
//! temporary file next to the destination and persisted only on full
//! success, so a failed save never leaves a truncated file behind.

use std::io::Write;
use std::path::Path;

use lopdf::{Document, ObjectId};
use tempfile::NamedTempFile;

use crate::error::{PdfDoctorError, Result};

/// Open an existing document, mapping a missing file to `NotFound` and a
/// malformed one to `Parse`.
pub fn open_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(PdfDoctorError::NotFound(path.display().to_string()));
    }
    Document::load(path).map_err(|e| PdfDoctorError::Parse(e.to_string()))
}

/// Whether the document carries an encryption dictionary.
pub fn is_encrypted(doc: &Document) -> bool {
    doc.trailer.get(b"Encrypt").is_ok()
}

/// Page object ids in page order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Serialize the document and write it to `path` atomically.
pub fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfDoctorError::Operation(format!("Save failed: {}", e)))?;
    write_atomic(path, &buffer)
}

/// Write bytes to `path` via a sibling temp file renamed on success.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| PdfDoctorError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_not_found() {
        let err = open_document(Path::new("/nonexistent/nowhere.pdf")).unwrap_err();
        assert!(matches!(err, PdfDoctorError::NotFound(_)));
    }

    #[test]
    fn test_open_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        let err = open_document(&path).unwrap_err();
        assert!(matches!(err, PdfDoctorError::Parse(_)));
    }

    #[test]
    fn test_write_atomic_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
