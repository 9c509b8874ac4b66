//! PDF ↔ Word conversion, delegated to a locally installed office engine.
//!
//! The engine (`soffice` by default, overridable through the
//! `PDFDOCTOR_OFFICE_ENGINE` environment variable) is treated as an opaque,
//! failable collaborator: this module only checks the input exists, derives
//! the destination path and surfaces engine failures unmodified.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::document::write_atomic;
use crate::error::{PdfDoctorError, Result};
use crate::outpath::{resolve_output, OutputKind};

const ENGINE_ENV: &str = "PDFDOCTOR_OFFICE_ENGINE";
const DEFAULT_ENGINE: &str = "soffice";

/// Convert a PDF into a Word document (default output: `.docx` swap).
pub fn pdf_to_word(path: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    convert_with_engine(&office_engine(), path, output, OutputKind::WordDocument, "docx")
}

/// Convert a Word document into a PDF (default output: `.pdf` swap).
pub fn word_to_pdf(path: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    convert_with_engine(&office_engine(), path, output, OutputKind::Pdf, "pdf")
}

fn office_engine() -> String {
    std::env::var(ENGINE_ENV).unwrap_or_else(|_| DEFAULT_ENGINE.to_string())
}

fn convert_with_engine(
    engine: &str,
    path: &Path,
    output: Option<PathBuf>,
    kind: OutputKind,
    target_ext: &str,
) -> Result<PathBuf> {
    if !path.exists() {
        return Err(PdfDoctorError::NotFound(path.display().to_string()));
    }
    let out = resolve_output(path, output, kind);

    // The engine writes into a directory of its choosing; convert into a
    // scratch directory, then move the result to the requested destination.
    let scratch = tempfile::tempdir()?;
    let result = Command::new(engine)
        .arg("--headless")
        .arg("--convert-to")
        .arg(target_ext)
        .arg("--outdir")
        .arg(scratch.path())
        .arg(path)
        .output();

    let output_info = match result {
        Ok(info) => info,
        Err(e) => {
            return Err(PdfDoctorError::ConversionFailure(format!(
                "Failed to launch '{}': {}",
                engine, e
            )))
        }
    };
    if !output_info.status.success() {
        let stderr = String::from_utf8_lossy(&output_info.stderr);
        return Err(PdfDoctorError::ConversionFailure(format!(
            "'{}' exited with {}: {}",
            engine,
            output_info.status,
            stderr.trim()
        )));
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let produced = scratch.path().join(format!("{}.{}", stem, target_ext));
    if !produced.exists() {
        return Err(PdfDoctorError::ConversionFailure(format!(
            "'{}' reported success but produced no output",
            engine
        )));
    }

    let bytes = std::fs::read(&produced)?;
    write_atomic(&out, &bytes)?;
    tracing::info!(path = %out.display(), "converted document");
    Ok(out)
}
