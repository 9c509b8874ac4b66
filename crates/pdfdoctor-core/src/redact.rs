//! Permanent text removal and best-effort replacement.
//!
//! Both operations share one pass: every page is searched first, all hits
//! are counted, then the page is mutated hit by hit. Matched glyphs are
//! removed from the show operators themselves: a `Tj` string becomes a `TJ`
//! array whose kerning numbers compensate for the removed advance, so the
//! surviving glyphs keep their positions and extraction no longer sees the
//! text. A filled rectangle is then painted over each vacated box, and the
//! replacement variant draws its new text into the box afterwards.
//!
//! Because hits are computed before any mutation, overlapping occurrences
//! inside one string keep first-match-wins behavior; the reported count is
//! always the pre-mutation hit count.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::content::{scan_page, search_runs, text_width, TextHit};
use crate::document::{open_document, page_ids, save_document};
use crate::error::{PdfDoctorError, Result};
use crate::outpath::{resolve_output, OutputKind};

/// Font size used for replacement text.
const REPLACEMENT_SIZE: f32 = 11.0;
/// Resource name of the injected replacement font.
const REPLACEMENT_FONT: &str = "FDoc";
/// Extra coverage around a fill box, in points.
const FILL_PADDING: f32 = 0.5;

#[derive(Clone, Copy)]
struct Fill {
    r: f32,
    g: f32,
    b: f32,
}

const BLACK: Fill = Fill { r: 0.0, g: 0.0, b: 0.0 };
const WHITE: Fill = Fill { r: 1.0, g: 1.0, b: 1.0 };

/// Black out every literal occurrence of `text`, removing the underlying
/// glyphs. Returns the occurrence count (0 is not an error) and the output
/// path.
pub fn redact(path: &Path, text: &str, output: Option<PathBuf>) -> Result<(usize, PathBuf)> {
    let (count, out) = apply_text_edit(path, text, None, output, OutputKind::Redacted, BLACK)?;
    tracing::info!(path = %out.display(), count, "redacted occurrences");
    Ok((count, out))
}

/// Replace every literal occurrence of `old_text` with `new_text`, drawn at
/// a fixed size into the vacated box. Cosmetic best effort, no reflow.
pub fn edit_text(
    path: &Path,
    old_text: &str,
    new_text: &str,
    output: Option<PathBuf>,
) -> Result<(usize, PathBuf)> {
    let (count, out) = apply_text_edit(
        path,
        old_text,
        Some(new_text),
        output,
        OutputKind::Edited,
        WHITE,
    )?;
    tracing::info!(path = %out.display(), count, "replaced occurrences");
    Ok((count, out))
}

fn apply_text_edit(
    path: &Path,
    needle: &str,
    replacement: Option<&str>,
    output: Option<PathBuf>,
    kind: OutputKind,
    fill: Fill,
) -> Result<(usize, PathBuf)> {
    if needle.is_empty() {
        return Err(PdfDoctorError::InvalidArgument(
            "Search text must not be empty".into(),
        ));
    }

    let mut doc = open_document(path)?;
    let mut total = 0;
    let mut font_id = None;

    for page_id in page_ids(&doc) {
        let (content, runs) = scan_page(&doc, page_id)?;
        let hits = search_runs(&runs, needle);
        if hits.is_empty() {
            continue;
        }
        total += hits.len();

        let mut operations = remove_hits(content, &hits);
        operations.extend(fill_operations(&hits, fill));
        if let Some(new_text) = replacement {
            operations.extend(replacement_operations(&hits, new_text));
            let font = *font_id.get_or_insert_with(|| {
                doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                })
            });
            ensure_page_font(&mut doc, page_id, font)?;
        }

        set_page_content(&mut doc, page_id, operations)?;
    }

    let out = resolve_output(path, output, kind);
    save_document(&mut doc, &out)?;
    Ok((total, out))
}

/// Rebuild the content operations with the matched glyph bytes removed.
///
/// Hit strings are spliced into TJ arrays; each removed segment is replaced
/// by a negative kerning number equal to its advance, so everything after it
/// stays put.
fn remove_hits(content: Content, hits: &[TextHit]) -> Vec<Operation> {
    // (op_index, elem_index) -> byte ranges to cut, in order.
    let mut cuts: BTreeMap<(usize, usize), Vec<(usize, usize)>> = BTreeMap::new();
    for hit in hits {
        cuts.entry((hit.op_index, hit.elem_index))
            .or_default()
            .push((hit.start, hit.len));
    }

    let mut operations = Vec::with_capacity(content.operations.len());
    for (op_index, op) in content.operations.into_iter().enumerate() {
        let touched = cuts.keys().any(|&(idx, _)| idx == op_index);
        if !touched {
            operations.push(op);
            continue;
        }
        match op.operator.as_str() {
            "Tj" => {
                if let Some(Object::String(bytes, format)) = op.operands.first() {
                    let ranges = cuts.get(&(op_index, 0)).cloned().unwrap_or_default();
                    let elements = splice_string(bytes, *format, &ranges);
                    operations.push(Operation::new("TJ", vec![Object::Array(elements)]));
                } else {
                    operations.push(op);
                }
            }
            "'" => {
                if let Some(Object::String(bytes, format)) = op.operands.first() {
                    let ranges = cuts.get(&(op_index, 0)).cloned().unwrap_or_default();
                    let elements = splice_string(bytes, *format, &ranges);
                    operations.push(Operation::new("T*", vec![]));
                    operations.push(Operation::new("TJ", vec![Object::Array(elements)]));
                } else {
                    operations.push(op);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac), Some(Object::String(bytes, format))) = (
                    op.operands.first(),
                    op.operands.get(1),
                    op.operands.get(2),
                ) {
                    let ranges = cuts.get(&(op_index, 0)).cloned().unwrap_or_default();
                    let elements = splice_string(bytes, *format, &ranges);
                    operations.push(Operation::new("Tw", vec![aw.clone()]));
                    operations.push(Operation::new("Tc", vec![ac.clone()]));
                    operations.push(Operation::new("T*", vec![]));
                    operations.push(Operation::new("TJ", vec![Object::Array(elements)]));
                } else {
                    operations.push(op);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let mut elements = Vec::with_capacity(items.len());
                    for (elem_index, item) in items.iter().enumerate() {
                        match item {
                            Object::String(bytes, format) => {
                                match cuts.get(&(op_index, elem_index)) {
                                    Some(ranges) => {
                                        elements.extend(splice_string(bytes, *format, ranges))
                                    }
                                    None => elements.push(item.clone()),
                                }
                            }
                            other => elements.push(other.clone()),
                        }
                    }
                    operations.push(Operation::new("TJ", vec![Object::Array(elements)]));
                } else {
                    operations.push(op);
                }
            }
            _ => operations.push(op),
        }
    }
    operations
}

/// Split a shown string around the cut ranges, compensating each removed
/// segment with a kerning number of equal advance.
fn splice_string(
    bytes: &[u8],
    format: StringFormat,
    ranges: &[(usize, usize)],
) -> Vec<Object> {
    let mut sorted: Vec<(usize, usize)> = ranges.to_vec();
    sorted.sort_unstable();

    let mut elements = Vec::new();
    let mut cursor = 0;
    for (start, len) in sorted {
        if start < cursor {
            // Overlaps a segment already removed; first match wins.
            continue;
        }
        if start > cursor {
            elements.push(Object::String(bytes[cursor..start].to_vec(), format));
        }
        let removed = text_width(&bytes[start..start + len]);
        elements.push(Object::Real(-removed));
        cursor = start + len;
    }
    if cursor < bytes.len() {
        elements.push(Object::String(bytes[cursor..].to_vec(), format));
    }
    elements
}

/// Painted boxes covering every hit.
fn fill_operations(hits: &[TextHit], fill: Fill) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(hits.len() + 3);
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "rg",
        vec![
            Object::Real(fill.r),
            Object::Real(fill.g),
            Object::Real(fill.b),
        ],
    ));
    for hit in hits {
        ops.push(Operation::new(
            "re",
            vec![
                Object::Real(hit.rect.x0 - FILL_PADDING),
                Object::Real(hit.rect.y0 - FILL_PADDING),
                Object::Real(hit.rect.width() + 2.0 * FILL_PADDING),
                Object::Real(hit.rect.height() + 2.0 * FILL_PADDING),
            ],
        ));
        ops.push(Operation::new("f", vec![]));
    }
    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Replacement text drawn left-aligned at each hit's baseline.
fn replacement_operations(hits: &[TextHit], new_text: &str) -> Vec<Operation> {
    let mut ops = Vec::new();
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "rg",
        vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
    ));
    for hit in hits {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(REPLACEMENT_FONT.as_bytes().to_vec()),
                Object::Real(REPLACEMENT_SIZE),
            ],
        ));
        ops.push(Operation::new(
            "Td",
            vec![
                Object::Real(hit.baseline_x),
                Object::Real(hit.baseline_y),
            ],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(
                new_text.as_bytes().to_vec(),
                StringFormat::Literal,
            )],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Replace the page's content with the given operations as a single stream.
fn set_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<()> {
    let encoded = Content { operations }
        .encode()
        .map_err(|e| PdfDoctorError::Operation(format!("Failed to encode content: {}", e)))?;
    let stream_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
    let dict = page
        .as_dict_mut()
        .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
    dict.set("Contents", Object::Reference(stream_id));
    Ok(())
}

/// Make the replacement font reachable from the page as `/FDoc`.
fn ensure_page_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<()> {
    // Locate the Resources dictionary: inline on the page, behind a
    // reference, or absent.
    let resources = {
        let page = doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
        page.get(b"Resources").ok().cloned()
    };

    match resources {
        Some(Object::Reference(res_id)) => {
            let res = doc
                .get_object_mut(res_id)
                .and_then(|o| o.as_dict_mut())
                .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
            insert_font_entry(res, font_id);
            // The Font entry itself may be a reference.
            if let Ok(Object::Reference(font_dict_id)) = res.get(b"Font").map(|o| o.clone()) {
                let fonts = doc
                    .get_object_mut(font_dict_id)
                    .and_then(|o| o.as_dict_mut())
                    .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
                fonts.set(REPLACEMENT_FONT, Object::Reference(font_id));
            }
        }
        Some(Object::Dictionary(mut res)) => {
            insert_font_entry(&mut res, font_id);
            if let Ok(Object::Reference(font_dict_id)) = res.get(b"Font").map(|o| o.clone()) {
                let fonts = doc
                    .get_object_mut(font_dict_id)
                    .and_then(|o| o.as_dict_mut())
                    .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
                fonts.set(REPLACEMENT_FONT, Object::Reference(font_id));
            }
            set_page_resources(doc, page_id, res)?;
        }
        _ => {
            let mut res = Dictionary::new();
            insert_font_entry(&mut res, font_id);
            set_page_resources(doc, page_id, res)?;
        }
    }
    Ok(())
}

/// Insert `/FDoc` into an inline Font dictionary, creating it when missing.
/// A referenced Font dictionary is left for the caller to patch.
fn insert_font_entry(resources: &mut Dictionary, font_id: ObjectId) {
    match resources.get_mut(b"Font") {
        Ok(Object::Dictionary(fonts)) => {
            fonts.set(REPLACEMENT_FONT, Object::Reference(font_id));
        }
        Ok(Object::Reference(_)) => {}
        _ => {
            let mut fonts = Dictionary::new();
            fonts.set(REPLACEMENT_FONT, Object::Reference(font_id));
            resources.set("Font", Object::Dictionary(fonts));
        }
    }
}

fn set_page_resources(doc: &mut Document, page_id: ObjectId, res: Dictionary) -> Result<()> {
    let page = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| PdfDoctorError::Operation(e.to_string()))?;
    page.set("Resources", Object::Dictionary(res));
    Ok(())
}
