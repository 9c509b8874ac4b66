//! Page-level operations: rotate, delete, range extraction.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use lopdf::Object;

use crate::document::{open_document, page_ids, save_document};
use crate::error::{PdfDoctorError, Result};
use crate::outpath::{resolve_output, OutputKind};

const VALID_ROTATIONS: [i64; 4] = [0, 90, 180, 270];

/// Set every page's absolute rotation.
///
/// The value overwrites any prior rotation; reapplying the same degree is a
/// no-op. Values outside {0, 90, 180, 270} are rejected before the document
/// is opened.
pub fn rotate(path: &Path, degrees: i64, output: Option<PathBuf>) -> Result<PathBuf> {
    if !VALID_ROTATIONS.contains(&degrees) {
        return Err(PdfDoctorError::InvalidArgument(format!(
            "Rotation must be one of 0, 90, 180, 270 (got {})",
            degrees
        )));
    }

    let mut doc = open_document(path)?;
    for page_id in page_ids(&doc) {
        let page = doc
            .get_object_mut(page_id)
            .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
        let dict = page
            .as_dict_mut()
            .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
        dict.set("Rotate", Object::Integer(degrees));
    }

    let out = resolve_output(path, output, OutputKind::Rotated);
    save_document(&mut doc, &out)?;
    tracing::info!(path = %out.display(), degrees, "rotated pages");
    Ok(out)
}

/// Delete the given zero-based page indices.
///
/// Indices are deduplicated and processed in descending order so earlier
/// deletions never shift the ones still pending. Out-of-range indices are
/// ignored. Deleting every page leaves a valid empty document.
pub fn delete_pages(path: &Path, indices: &[usize], output: Option<PathBuf>) -> Result<PathBuf> {
    let mut doc = open_document(path)?;
    let page_count = doc.get_pages().len();

    let mut targets: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&idx| idx < page_count)
        .collect();
    targets.sort_unstable();
    targets.dedup();

    for idx in targets.into_iter().rev() {
        doc.delete_pages(&[(idx + 1) as u32]);
    }

    let out = resolve_output(path, output, OutputKind::Deleted);
    save_document(&mut doc, &out)?;
    tracing::info!(path = %out.display(), "deleted pages");
    Ok(out)
}

/// Extract the inclusive 1-based range `[start, end]` into a new document.
pub fn extract_range(
    path: &Path,
    start: u32,
    end: u32,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let doc = open_document(path)?;
    let page_count = doc.get_pages().len() as u32;

    if start == 0 || start > end || end > page_count {
        return Err(PdfDoctorError::InvalidArgument(format!(
            "Page range {}-{} is outside 1-{}",
            start, end, page_count
        )));
    }

    // Construction by whitelist: clone, drop the complement, prune orphans.
    let mut new_doc = doc.clone();
    let keep: HashSet<u32> = (start..=end).collect();
    let mut to_delete: Vec<u32> = (1..=page_count).filter(|p| !keep.contains(p)).collect();
    to_delete.reverse();
    for page_num in to_delete {
        new_doc.delete_pages(&[page_num]);
    }
    new_doc.prune_objects();
    new_doc.compress();

    let out = resolve_output(path, output, OutputKind::PageRange { start, end });
    save_document(&mut new_doc, &out)?;
    tracing::info!(path = %out.display(), start, end, "extracted page range");
    Ok(out)
}
