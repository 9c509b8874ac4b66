//! Content-stream text scanning.
//!
//! Walks a page's decoded content stream with a small text-state machine and
//! yields every shown string together with the baseline position it was
//! drawn at. Literal search and plain-text assembly are built on top of the
//! same walk, so search results and extracted text always agree.
//!
//! Coordinates are PDF user space (origin bottom-left, y grows upward).
//! Horizontal extents are estimated from built-in Helvetica metrics when the
//! font provides no widths; callers that paint over a match pad the box.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;

use crate::error::{PdfDoctorError, Result};

/// Axis-aligned box in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// One shown string and where it was drawn.
#[derive(Debug, Clone)]
pub struct TextRun {
    /// Index of the show operation in the decoded content stream.
    pub op_index: usize,
    /// Index of the string element inside a TJ array (0 otherwise).
    pub elem_index: usize,
    /// Raw string bytes as they appear in the stream.
    pub bytes: Vec<u8>,
    /// Decoded view of `bytes` for text assembly.
    pub text: String,
    /// Baseline origin.
    pub x: f32,
    pub y: f32,
    /// Font size active when the string was shown.
    pub size: f32,
}

impl TextRun {
    /// Advance width of the run in user-space units.
    pub fn advance(&self) -> f32 {
        text_width(&self.bytes) / 1000.0 * self.size
    }
}

/// A literal-search match inside a single run.
#[derive(Debug, Clone)]
pub struct TextHit {
    pub op_index: usize,
    pub elem_index: usize,
    /// Byte offset of the match within the run's string.
    pub start: usize,
    pub len: usize,
    /// Baseline of the matched glyphs (left edge).
    pub baseline_x: f32,
    pub baseline_y: f32,
    pub size: f32,
    pub rect: Rect,
}

// Fraction of the font size the box extends below and above the baseline.
const DESCENT: f32 = 0.22;
const ASCENT: f32 = 0.80;

struct TextState {
    size: f32,
    leading: f32,
    line_x: f32,
    line_y: f32,
    x: f32,
    y: f32,
}

impl TextState {
    fn new() -> Self {
        Self {
            size: 12.0,
            leading: 0.0,
            line_x: 0.0,
            line_y: 0.0,
            x: 0.0,
            y: 0.0,
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_x += tx;
        self.line_y += ty;
        self.x = self.line_x;
        self.y = self.line_y;
    }

    fn next_line(&mut self) {
        self.line_y -= self.leading;
        self.x = self.line_x;
        self.y = self.line_y;
    }
}

/// Decode a page's content stream and collect its text runs.
pub fn scan_page(doc: &Document, page_id: ObjectId) -> Result<(Content, Vec<TextRun>)> {
    let data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfDoctorError::Parse(format!("Failed to read page content: {}", e)))?;
    let content = Content::decode(&data)
        .map_err(|e| PdfDoctorError::Parse(format!("Failed to decode page content: {}", e)))?;

    let mut runs = Vec::new();
    let mut state = TextState::new();

    for (op_index, op) in content.operations.iter().enumerate() {
        match op.operator.as_str() {
            "BT" => state = TextState::new(),
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(operand_to_f32) {
                    state.size = size;
                }
            }
            "TL" => {
                if let Some(l) = op.operands.first().and_then(operand_to_f32) {
                    state.leading = l;
                }
            }
            "Td" => {
                let tx = op.operands.first().and_then(operand_to_f32).unwrap_or(0.0);
                let ty = op.operands.get(1).and_then(operand_to_f32).unwrap_or(0.0);
                state.move_line(tx, ty);
            }
            "TD" => {
                let tx = op.operands.first().and_then(operand_to_f32).unwrap_or(0.0);
                let ty = op.operands.get(1).and_then(operand_to_f32).unwrap_or(0.0);
                state.leading = -ty;
                state.move_line(tx, ty);
            }
            "Tm" => {
                // Translation components only; scale and skew are not tracked.
                let e = op.operands.get(4).and_then(operand_to_f32).unwrap_or(0.0);
                let f = op.operands.get(5).and_then(operand_to_f32).unwrap_or(0.0);
                state.line_x = e;
                state.line_y = f;
                state.x = e;
                state.y = f;
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    push_run(&mut runs, &mut state, op_index, 0, bytes);
                }
            }
            "'" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    push_run(&mut runs, &mut state, op_index, 0, bytes);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    push_run(&mut runs, &mut state, op_index, 0, bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for (elem_index, item) in items.iter().enumerate() {
                        match item {
                            Object::String(bytes, _) => {
                                push_run(&mut runs, &mut state, op_index, elem_index, bytes);
                            }
                            _ => {
                                if let Some(n) = operand_to_f32(item) {
                                    state.x -= n / 1000.0 * state.size;
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok((content, runs))
}

fn push_run(
    runs: &mut Vec<TextRun>,
    state: &mut TextState,
    op_index: usize,
    elem_index: usize,
    bytes: &[u8],
) {
    let run = TextRun {
        op_index,
        elem_index,
        bytes: bytes.to_vec(),
        text: decode_text_bytes(bytes),
        x: state.x,
        y: state.y,
        size: state.size,
    };
    state.x += run.advance();
    runs.push(run);
}

/// Find non-overlapping literal occurrences of `needle` in a page's runs.
///
/// Matching is case-sensitive and byte-exact within one shown string;
/// occurrences spanning show-operator boundaries are not detected.
pub fn search_runs(runs: &[TextRun], needle: &str) -> Vec<TextHit> {
    let pattern = needle.as_bytes();
    let mut hits = Vec::new();
    if pattern.is_empty() {
        return hits;
    }

    for run in runs {
        let mut offset = 0;
        while offset + pattern.len() <= run.bytes.len() {
            if &run.bytes[offset..offset + pattern.len()] == pattern {
                let prefix = text_width(&run.bytes[..offset]) / 1000.0 * run.size;
                let matched =
                    text_width(&run.bytes[offset..offset + pattern.len()]) / 1000.0 * run.size;
                let x0 = run.x + prefix;
                hits.push(TextHit {
                    op_index: run.op_index,
                    elem_index: run.elem_index,
                    start: offset,
                    len: pattern.len(),
                    baseline_x: x0,
                    baseline_y: run.y,
                    size: run.size,
                    rect: Rect {
                        x0,
                        y0: run.y - DESCENT * run.size,
                        x1: x0 + matched,
                        y1: run.y + ASCENT * run.size,
                    },
                });
                offset += pattern.len();
            } else {
                offset += 1;
            }
        }
    }
    hits
}

/// Search one page for a literal string.
pub fn search_page(doc: &Document, page_id: ObjectId, needle: &str) -> Result<Vec<TextHit>> {
    let (_, runs) = scan_page(doc, page_id)?;
    Ok(search_runs(&runs, needle))
}

/// Assemble a page's runs into plain text, content order, one line per
/// baseline.
pub fn page_text(runs: &[TextRun]) -> String {
    let mut text = String::new();
    let mut last: Option<(f32, f32, f32)> = None; // (y, x_end, size)

    for run in runs {
        if let Some((prev_y, prev_end, prev_size)) = last {
            if (run.y - prev_y).abs() > 0.1 {
                text.push('\n');
            } else if run.x - prev_end > 0.25 * prev_size && !text.ends_with(' ') {
                text.push(' ');
            }
        }
        text.push_str(&run.text);
        last = Some((run.y, run.x + run.advance(), run.size));
    }
    text
}

/// Decode PDF string bytes: UTF-8, then BOM-marked UTF-16BE, then Latin-1.
pub(crate) fn decode_text_bytes(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn operand_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Sum of glyph widths in thousandths of an em.
pub(crate) fn text_width(bytes: &[u8]) -> f32 {
    bytes.iter().map(|&b| glyph_width(b)).sum()
}

/// Helvetica AFM width for a byte code, 500 for codes outside the table.
pub(crate) fn glyph_width(code: u8) -> f32 {
    if (0x20..=0x7E).contains(&code) {
        HELVETICA_WIDTHS[(code - 0x20) as usize] as f32
    } else {
        500.0
    }
}

// Widths for codes 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // sp..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a..z
    334, 260, 334, 584, // {..~
];

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Dictionary, Stream, StringFormat};

    fn single_page_doc(operations: Vec<Operation>) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        (doc, page_id)
    }

    fn show_text_ops(text: &str, x: i64, y: i64) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 12.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    text.as_bytes().to_vec(),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ]
    }

    #[test]
    fn test_scan_single_tj() {
        let (doc, page_id) = single_page_doc(show_text_ops("Hello World", 72, 700));
        let (_, runs) = scan_page(&doc, page_id).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hello World");
        assert_eq!(runs[0].x, 72.0);
        assert_eq!(runs[0].y, 700.0);
        assert_eq!(runs[0].size, 12.0);
    }

    #[test]
    fn test_scan_tj_array_tracks_elements() {
        let items = vec![
            Object::String(b"AB".to_vec(), StringFormat::Literal),
            Object::Integer(-1000),
            Object::String(b"CD".to_vec(), StringFormat::Literal),
        ];
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 10.into()]),
            Operation::new("Td", vec![100.into(), 100.into()]),
            Operation::new("TJ", vec![Object::Array(items)]),
            Operation::new("ET", vec![]),
        ];
        let (doc, page_id) = single_page_doc(ops);
        let (_, runs) = scan_page(&doc, page_id).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].elem_index, 0);
        assert_eq!(runs[1].elem_index, 2);
        // -1000 thousandths at size 10 moves the cursor 10 units right.
        let expected = 100.0 + text_width(b"AB") / 1000.0 * 10.0 + 10.0;
        assert!((runs[1].x - expected).abs() < 0.01);
    }

    #[test]
    fn test_search_finds_all_occurrences() {
        let (doc, page_id) = single_page_doc(show_text_ops("abc TOKEN def TOKEN", 50, 500));
        let hits = search_page(&doc, page_id, "TOKEN").unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].rect.x0 < hits[1].rect.x0);
        assert!(hits[0].rect.width() > 0.0);
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let (doc, page_id) = single_page_doc(show_text_ops("Token TOKEN token", 50, 500));
        let hits = search_page(&doc, page_id, "TOKEN").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_search_empty_needle_matches_nothing() {
        let (doc, page_id) = single_page_doc(show_text_ops("anything", 50, 500));
        let hits = search_page(&doc, page_id, "").unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_hit_rect_offsets_by_prefix_width() {
        let (doc, page_id) = single_page_doc(show_text_ops("iiiiW", 10, 10));
        let hits = search_page(&doc, page_id, "W").unwrap();
        assert_eq!(hits.len(), 1);
        let prefix = text_width(b"iiii") / 1000.0 * 12.0;
        assert!((hits[0].rect.x0 - (10.0 + prefix)).abs() < 0.01);
    }

    #[test]
    fn test_page_text_inserts_newlines_between_baselines() {
        let mut ops = show_text_ops("first line", 72, 700);
        ops.extend(show_text_ops("second line", 72, 680));
        let (doc, page_id) = single_page_doc(ops);
        let (_, runs) = scan_page(&doc, page_id).unwrap();
        assert_eq!(page_text(&runs), "first line\nsecond line");
    }

    #[test]
    fn test_decode_utf16be() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_bytes(&bytes), "Hi");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let bytes = [0x48, 0xE9];
        assert_eq!(decode_text_bytes(&bytes), "Hé");
    }
}
