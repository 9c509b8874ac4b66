//! End-to-end checks of the operations layer over real files.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use pdfdoctor_core::error::PdfDoctorError;

/// Build a PDF on disk with one text line per page and optional Info fields.
fn build_pdf(dir: &Path, name: &str, page_texts: &[&str], title: Option<&str>) -> PathBuf {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let mut kids = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        text.as_bytes().to_vec(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }
    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => page_texts.len() as i64,
        "Kids" => kids,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "CreationDate" => Object::string_literal("D:20240301080000+00'00'"),
        });
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

fn page_rotations(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            doc.get_object(id)
                .and_then(|o| o.as_dict())
                .ok()
                .and_then(|d| d.get(b"Rotate").ok().and_then(|r| r.as_i64().ok()))
                .unwrap_or(0)
        })
        .collect()
}

#[test]
fn info_reports_source_page_count() {
    let dir = tempfile::tempdir().unwrap();
    for n in [1usize, 3, 7] {
        let texts: Vec<String> = (0..n).map(|i| format!("page {}", i + 1)).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let input = build_pdf(dir.path(), &format!("doc{}.pdf", n), &refs, None);
        let info = pdfdoctor_core::get_info(&input).unwrap();
        assert_eq!(info.pages, n);
    }
}

#[test]
fn extract_range_yields_inclusive_count() {
    let dir = tempfile::tempdir().unwrap();
    let texts: Vec<String> = (0..8).map(|i| format!("page {}", i + 1)).collect();
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    let input = build_pdf(dir.path(), "doc.pdf", &refs, None);

    let out = pdfdoctor_core::extract_range(&input, 3, 6, None).unwrap();
    let info = pdfdoctor_core::get_info(&out).unwrap();
    assert_eq!(info.pages, 4);
}

#[test]
fn delete_pages_count_math_with_out_of_range_noops() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(dir.path(), "doc.pdf", &["a", "b", "c", "d", "e"], None);

    // Two valid unique indices, one duplicate, one out of range.
    let out = pdfdoctor_core::delete_pages(&input, &[1, 3, 3, 42], None).unwrap();
    let info = pdfdoctor_core::get_info(&out).unwrap();
    assert_eq!(info.pages, 3);
}

#[test]
fn merge_adds_page_counts_and_skips_missing() {
    let dir = tempfile::tempdir().unwrap();
    let a = build_pdf(dir.path(), "a.pdf", &["a1", "a2"], None);
    let b = build_pdf(dir.path(), "b.pdf", &["b1", "b2", "b3"], None);
    let missing = dir.path().join("missing.pdf");

    let out = dir.path().join("merged.pdf");
    pdfdoctor_core::merge(&[a.clone(), b.clone()], &out).unwrap();
    assert_eq!(pdfdoctor_core::get_info(&out).unwrap().pages, 5);

    let out2 = dir.path().join("merged2.pdf");
    pdfdoctor_core::merge(&[a, missing, b], &out2).unwrap();
    assert_eq!(pdfdoctor_core::get_info(&out2).unwrap().pages, 5);
}

#[test]
fn rotate_is_absolute_not_cumulative() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(dir.path(), "doc.pdf", &["one", "two"], None);

    let once = pdfdoctor_core::rotate(&input, 90, None).unwrap();
    let twice = pdfdoctor_core::rotate(&once, 90, Some(dir.path().join("twice.pdf"))).unwrap();

    assert_eq!(page_rotations(&once), vec![90, 90]);
    assert_eq!(page_rotations(&once), page_rotations(&twice));
}

#[test]
fn rotate_five_page_report_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(
        dir.path(),
        "report.pdf",
        &["r1", "r2", "r3", "r4", "r5"],
        Some("Report"),
    );

    let out = pdfdoctor_core::rotate(&input, 90, None).unwrap();
    let info = pdfdoctor_core::get_info(&out).unwrap();
    assert_eq!(info.pages, 5);
    assert_eq!(info.title, "Report");
    assert_eq!(page_rotations(&out), vec![90; 5]);
}

#[test]
fn encrypt_decrypt_round_trips_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(
        dir.path(),
        "doc.pdf",
        &["confidential alpha", "confidential beta"],
        None,
    );

    let original_txt = pdfdoctor_core::extract_text(&input, None).unwrap();
    let original = std::fs::read_to_string(&original_txt).unwrap();

    let protected = pdfdoctor_core::encrypt(&input, "pa55word", None).unwrap();
    assert!(pdfdoctor_core::get_info(&protected).unwrap().encrypted);

    let restored = pdfdoctor_core::decrypt(&protected, "pa55word", None).unwrap();
    let info = pdfdoctor_core::get_info(&restored).unwrap();
    assert!(!info.encrypted);

    let restored_txt = pdfdoctor_core::extract_text(&restored, None).unwrap();
    assert_eq!(std::fs::read_to_string(&restored_txt).unwrap(), original);
}

#[test]
fn decrypt_with_wrong_password_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(dir.path(), "doc.pdf", &["secret"], None);
    let protected = pdfdoctor_core::encrypt(&input, "right", None).unwrap();

    let err = pdfdoctor_core::decrypt(&protected, "wrong", None).unwrap_err();
    assert!(matches!(err, PdfDoctorError::InvalidCredentials));
    assert!(!dir.path().join("doc_encrypted_decrypted.pdf").exists());
}

#[test]
fn redact_counts_three_and_strips_token() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(
        dir.path(),
        "doc.pdf",
        &[
            "intro UNIQUETOKEN here",
            "clean page",
            "UNIQUETOKEN and UNIQUETOKEN",
        ],
        None,
    );

    let (count, out) = pdfdoctor_core::redact(&input, "UNIQUETOKEN", None).unwrap();
    assert_eq!(count, 3);

    let txt = pdfdoctor_core::extract_text(&out, None).unwrap();
    let text = std::fs::read_to_string(&txt).unwrap();
    assert!(!text.contains("UNIQUETOKEN"));
    assert!(text.contains("intro"));
    assert!(text.contains("clean page"));
}

#[test]
fn edit_text_counts_and_substitutes() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(
        dir.path(),
        "doc.pdf",
        &["price is DRAFT", "DRAFT again"],
        None,
    );

    let (count, out) = pdfdoctor_core::edit_text(&input, "DRAFT", "FINAL", None).unwrap();
    assert_eq!(count, 2);

    let txt = pdfdoctor_core::extract_text(&out, None).unwrap();
    let text = std::fs::read_to_string(&txt).unwrap();
    assert!(!text.contains("DRAFT"));
    assert!(text.contains("FINAL"));
}

#[test]
fn extract_text_separates_pages_with_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(dir.path(), "doc.pdf", &["first page", "second page"], None);
    let out = pdfdoctor_core::extract_text(&input, None).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text, "first page\n\nsecond page\n\n");
}

#[test]
fn operations_never_touch_the_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = build_pdf(dir.path(), "doc.pdf", &["immutable input"], None);
    let before = std::fs::read(&input).unwrap();

    pdfdoctor_core::rotate(&input, 180, None).unwrap();
    pdfdoctor_core::delete_pages(&input, &[0], None).unwrap();
    pdfdoctor_core::redact(&input, "immutable", None).unwrap();
    pdfdoctor_core::encrypt(&input, "pw", None).unwrap();

    assert_eq!(std::fs::read(&input).unwrap(), before);
}
