//! Document merging.
//!
//! Builds an empty destination, then appends every existing input in order.
//! Object ids of each source are remapped past the destination's current
//! maximum so references never collide, and the page tree is rebuilt once at
//! the end. Inputs that do not exist are skipped without error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, ObjectId};

use crate::document::save_document;
use crate::error::{PdfDoctorError, Result};

/// Merge `paths` in order into a single document written to `output`.
///
/// Nonexistent inputs are skipped silently. With no surviving inputs the
/// result is a valid empty document. Only one source is held open at a time
/// alongside the accumulator.
pub fn merge(paths: &[PathBuf], output: &Path) -> Result<PathBuf> {
    let mut dest = empty_document();
    let mut dest_page_refs: Vec<ObjectId> = Vec::new();

    for path in paths {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "skipping missing merge input");
            continue;
        }
        let source = Document::load(path).map_err(|e| {
            PdfDoctorError::Parse(format!("Failed to load '{}': {}", path.display(), e))
        })?;
        append_document(&mut dest, &mut dest_page_refs, source);
    }

    update_page_tree(&mut dest, dest_page_refs)?;
    dest.compress();

    save_document(&mut dest, output)?;
    tracing::info!(path = %output.display(), "merged documents");
    Ok(output.to_path_buf())
}

/// A document with a catalog and an empty page tree.
fn empty_document() -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Count" => 0,
        "Kids" => Object::Array(vec![]),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// Move every object of `source` into `dest` with remapped ids and record
/// the source's pages in `dest_page_refs`.
fn append_document(dest: &mut Document, dest_page_refs: &mut Vec<ObjectId>, source: Document) {
    let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
    let id_offset = dest.max_id;

    let mut remapped_objects = BTreeMap::new();
    for (old_id, object) in source.objects.into_iter() {
        let new_id = (old_id.0 + id_offset, old_id.1);
        remapped_objects.insert(new_id, remap_object_refs(object, id_offset));
    }
    for (id, object) in remapped_objects {
        dest.objects.insert(id, object);
    }

    for old_page_ref in source_pages {
        dest_page_refs.push((old_page_ref.0 + id_offset, old_page_ref.1));
    }

    dest.max_id = (source.max_id + id_offset).max(dest.max_id);
}

/// Recursively shift object references by `offset`.
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the destination's page tree at the accumulated page list.
fn update_page_tree(doc: &mut Document, page_refs: Vec<ObjectId>) -> Result<()> {
    let root_obj = doc
        .trailer
        .get(b"Root")
        .map_err(|_| PdfDoctorError::Operation("No Root in trailer".into()))?;
    let catalog_id = root_obj
        .as_reference()
        .map_err(|_| PdfDoctorError::Operation("Root is not a reference".into()))?;

    let catalog = doc
        .objects
        .get(&catalog_id)
        .ok_or_else(|| PdfDoctorError::Operation("Catalog not found".into()))?
        .as_dict()
        .map_err(|_| PdfDoctorError::Operation("Invalid catalog".into()))?;

    let pages_id = catalog
        .get(b"Pages")
        .map_err(|_| PdfDoctorError::Operation("No Pages in catalog".into()))?
        .as_reference()
        .map_err(|_| PdfDoctorError::Operation("Pages is not a reference".into()))?;

    if let Some(Object::Dictionary(ref mut pages_dict)) = doc.objects.get_mut(&pages_id) {
        let kids = page_refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
        Ok(())
    } else {
        Err(PdfDoctorError::Operation("Invalid pages dictionary".into()))
    }
}
