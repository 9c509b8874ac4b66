//! Document operations over PDF files.
//!
//! This crate is the operations layer behind the `pdfdoctor` CLI: metadata
//! inspection, text extraction, merge, rotate, page deletion, range
//! extraction, redaction, text replacement, password protection and
//! PDF ↔ Word conversion. Every operation opens its document, transforms
//! it, saves to a derived (or caller-supplied) destination and releases the
//! handle before returning. Input files are never overwritten.

pub mod content;
pub mod convert;
pub mod document;
pub mod error;
pub mod extract;
pub mod info;
pub mod merge;
pub mod outpath;
pub mod pages;
pub mod redact;
pub mod security;

pub use content::{Rect, TextHit};
pub use convert::{pdf_to_word, word_to_pdf};
pub use error::PdfDoctorError;
pub use extract::extract_text;
pub use info::{get_info, DocumentInfo};
pub use merge::merge;
pub use outpath::{default_output, OutputKind};
pub use pages::{delete_pages, extract_range, rotate};
pub use redact::{edit_text, redact};
pub use security::{decrypt, encrypt};

use error::Result;

/// Parse a 1-based page list like `"1,3,5"` or `"2-4, 7"` into sorted,
/// deduplicated zero-based indices.
pub fn parse_page_list(input: &str) -> Result<Vec<usize>> {
    use std::collections::BTreeSet;

    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: usize = parse_page_number(start)?;
            let end: usize = parse_page_number(end)?;
            if start > end {
                return Err(PdfDoctorError::InvalidArgument(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }
            for page in start..=end {
                pages.insert(page - 1);
            }
        } else {
            pages.insert(parse_page_number(part)? - 1);
        }
    }

    Ok(pages.into_iter().collect())
}

fn parse_page_number(text: &str) -> Result<usize> {
    let page: usize = text
        .trim()
        .parse()
        .map_err(|_| PdfDoctorError::InvalidArgument(format!("Invalid page: '{}'", text.trim())))?;
    if page == 0 {
        return Err(PdfDoctorError::InvalidArgument(
            "Page numbers must be >= 1".into(),
        ));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_list_single() {
        assert_eq!(parse_page_list("5").unwrap(), vec![4]);
    }

    #[test]
    fn test_parse_page_list_commas() {
        assert_eq!(parse_page_list("1,3,5").unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn test_parse_page_list_ranges_and_spaces() {
        assert_eq!(parse_page_list("1-3, 5").unwrap(), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_parse_page_list_deduplicates() {
        assert_eq!(parse_page_list("2,2,1-2").unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_parse_page_list_rejects_zero() {
        assert!(parse_page_list("0,2").is_err());
    }

    #[test]
    fn test_parse_page_list_rejects_junk() {
        assert!(parse_page_list("1,two,3").is_err());
        assert!(parse_page_list("3-1").is_err());
    }
}
