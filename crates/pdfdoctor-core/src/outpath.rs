//! Default destination paths for mutating operations.
//!
//! Every operation that writes a file derives its destination from the input
//! path and a fixed per-operation suffix when the caller does not supply one.
//! The input file itself is never chosen as the destination.

use std::path::{Path, PathBuf};

/// Naming rule applied when no explicit output path is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Rotated,
    Deleted,
    PageRange { start: u32, end: u32 },
    Redacted,
    Edited,
    Encrypted,
    Decrypted,
    PlainText,
    WordDocument,
    Pdf,
}

/// Compute the default destination for `input` under the given rule.
pub fn default_output(input: &Path, kind: OutputKind) -> PathBuf {
    match kind {
        OutputKind::Rotated => with_suffix(input, "_rotated"),
        OutputKind::Deleted => with_suffix(input, "_deleted"),
        OutputKind::PageRange { start, end } => {
            with_suffix(input, &format!("_pages_{}-{}", start, end))
        }
        OutputKind::Redacted => with_suffix(input, "_redacted"),
        OutputKind::Edited => with_suffix(input, "_edited"),
        OutputKind::Encrypted => with_suffix(input, "_encrypted"),
        OutputKind::Decrypted => with_suffix(input, "_decrypted"),
        OutputKind::PlainText => input.with_extension("txt"),
        OutputKind::WordDocument => input.with_extension("docx"),
        OutputKind::Pdf => input.with_extension("pdf"),
    }
}

/// Use the caller-supplied path when present, the suffix rule otherwise.
pub fn resolve_output(input: &Path, output: Option<PathBuf>, kind: OutputKind) -> PathBuf {
    output.unwrap_or_else(|| default_output(input, kind))
}

fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    match input.extension().and_then(|s| s.to_str()) {
        Some(ext) => input.with_file_name(format!("{}{}.{}", stem, suffix, ext)),
        None => input.with_file_name(format!("{}{}", stem, suffix)),
    }
}
