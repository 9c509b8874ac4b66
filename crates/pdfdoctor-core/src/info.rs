//! Document metadata inspection.

use std::path::Path;

use chrono::NaiveDateTime;
use lopdf::{Document, Object};
use serde::Serialize;

use crate::content::decode_text_bytes;
use crate::document::{is_encrypted, open_document};
use crate::error::Result;

const ABSENT: &str = "N/A";

/// Read-only snapshot of a document's metadata, taken at open time.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub pages: usize,
    pub encrypted: bool,
    pub format: String,
    pub title: String,
    pub author: String,
    pub creation_date: String,
    pub mod_date: String,
}

/// Open the document, snapshot its metadata and release it.
///
/// On an encrypted document the structural fields are still reported while
/// the string fields fall back to the absent sentinel.
pub fn get_info(path: &Path) -> Result<DocumentInfo> {
    let doc = open_document(path)?;
    let encrypted = is_encrypted(&doc);

    let (title, author, creation_date, mod_date) = if encrypted {
        (
            ABSENT.to_string(),
            ABSENT.to_string(),
            ABSENT.to_string(),
            ABSENT.to_string(),
        )
    } else {
        (
            info_string(&doc, b"Title"),
            info_string(&doc, b"Author"),
            format_pdf_date(&info_raw(&doc, b"CreationDate")),
            format_pdf_date(&info_raw(&doc, b"ModDate")),
        )
    };

    let info = DocumentInfo {
        pages: doc.get_pages().len(),
        encrypted,
        format: format!("PDF-{}", doc.version),
        title,
        author,
        creation_date,
        mod_date,
    };
    tracing::debug!(path = %path.display(), pages = info.pages, "inspected document");
    Ok(info)
}

/// Canonicalize a PDF date string to `YYYY-MM-DD HH:MM:SS`.
///
/// Accepts the `D:YYYYMMDDHHMMSS` prefix form with optional timezone tail.
/// Unparseable input comes back unchanged; an empty one becomes the absent
/// sentinel. This never fails.
pub fn format_pdf_date(raw: &str) -> String {
    if raw.is_empty() {
        return ABSENT.to_string();
    }
    let digits: String = raw
        .trim_start_matches("D:")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .take(14)
        .collect();
    if digits.len() == 14 {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&digits, "%Y%m%d%H%M%S") {
            return dt.format("%Y-%m-%d %H:%M:%S").to_string();
        }
    }
    raw.to_string()
}

fn info_string(doc: &Document, key: &[u8]) -> String {
    let raw = info_raw(doc, key);
    if raw.is_empty() {
        ABSENT.to_string()
    } else {
        raw
    }
}

fn info_raw(doc: &Document, key: &[u8]) -> String {
    let Ok(info_obj) = doc.trailer.get(b"Info") else {
        return String::new();
    };
    let dict = match info_obj {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return String::new(),
        },
        Object::Dictionary(dict) => dict,
        _ => return String::new(),
    };
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => decode_text_bytes(bytes),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Dictionary, Stream};
    use pretty_assertions::assert_eq;

    fn doc_with_info(num_pages: usize, info: Option<Dictionary>) -> (tempfile::TempDir, std::path::PathBuf) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..num_pages {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), b"BT ET".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => Object::Reference(content_id),
            });
            kids.push(Object::Reference(page_id));
        }
        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => num_pages as i64,
            "Kids" => kids,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        if let Some(info) = info {
            let info_id = doc.add_object(Object::Dictionary(info));
            doc.trailer.set("Info", Object::Reference(info_id));
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        doc.save(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn test_info_reports_page_count_and_format() {
        let (_dir, path) = doc_with_info(3, None);
        let info = get_info(&path).unwrap();
        assert_eq!(info.pages, 3);
        assert!(!info.encrypted);
        assert_eq!(info.format, "PDF-1.5");
    }

    #[test]
    fn test_info_absent_fields_use_sentinel() {
        let (_dir, path) = doc_with_info(1, None);
        let info = get_info(&path).unwrap();
        assert_eq!(info.title, "N/A");
        assert_eq!(info.author, "N/A");
        assert_eq!(info.creation_date, "N/A");
    }

    #[test]
    fn test_info_reads_metadata_fields() {
        let meta = dictionary! {
            "Title" => Object::string_literal("Report"),
            "Author" => Object::string_literal("Boba"),
            "CreationDate" => Object::string_literal("D:20240115093045+00'00'"),
        };
        let (_dir, path) = doc_with_info(1, Some(meta));
        let info = get_info(&path).unwrap();
        assert_eq!(info.title, "Report");
        assert_eq!(info.author, "Boba");
        assert_eq!(info.creation_date, "2024-01-15 09:30:45");
        assert_eq!(info.mod_date, "N/A");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = get_info(Path::new("/no/such/file.pdf")).unwrap_err();
        assert!(matches!(err, crate::error::PdfDoctorError::NotFound(_)));
    }

    #[test]
    fn test_format_pdf_date_canonical() {
        assert_eq!(format_pdf_date("D:20231201120000"), "2023-12-01 12:00:00");
        assert_eq!(format_pdf_date("D:20231201120000+05'30'"), "2023-12-01 12:00:00");
    }

    #[test]
    fn test_format_pdf_date_fallbacks() {
        assert_eq!(format_pdf_date(""), "N/A");
        // Too short or malformed comes back untouched.
        assert_eq!(format_pdf_date("D:2023"), "D:2023");
        assert_eq!(format_pdf_date("yesterday"), "yesterday");
        // An impossible calendar date is not silently rewritten.
        assert_eq!(format_pdf_date("D:20231399999999"), "D:20231399999999");
    }
}
