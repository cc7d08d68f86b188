// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF document handle: open, inspect, edit pages, merge, and split existing
// PDF documents using the `lopdf` crate.

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId, dictionary};
use tabellwerk_core::error::{Result, TabellwerkError};
use tracing::{debug, info, instrument, warn};

/// An editable in-memory PDF.
///
/// Wraps `lopdf::Document`. Page numbers are 1-based throughout, matching the
/// numbering shown to users.
#[derive(Clone)]
pub struct PdfDocument {
    document: Document,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    ///
    /// Fails with `NotFound` when the path does not exist and `Unreadable` when
    /// the file is not a loadable PDF.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TabellwerkError::NotFound(path.to_path_buf()));
        }

        let document = Document::load(path).map_err(|err| {
            TabellwerkError::Unreadable(format!("{}: {}", path.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Load a PDF from bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| TabellwerkError::Unreadable(format!("in-memory PDF: {}", err)))?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    /// Create a document of `page_count` empty pages of the given size in points.
    pub fn blank(page_count: u32, width_pt: f32, height_pt: f32) -> Self {
        let (mut document, pages_id) = skeleton();
        for _ in 0..page_count {
            let content_id = document.add_object(lopdf::Stream::new(dictionary! {}, Vec::new()));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width_pt),
                    Object::Real(height_pt),
                ],
            });
            append_kid(&mut document, pages_id, page_id);
        }
        Self { document }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Borrow the underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.document
    }

    pub(crate) fn inner_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Object id of a 1-based page.
    pub fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(TabellwerkError::OutOfRange {
                page,
                page_count: self.page_count(),
            })
    }

    /// Current `/Rotate` value of a page, normalised to 0, 90, 180 or 270.
    pub fn rotation(&self, page: u32) -> Result<u32> {
        let page_id = self.page_id(page)?;
        let raw = self
            .document
            .get_dictionary(page_id)
            .ok()
            .and_then(|dict| dict.get(b"Rotate").ok())
            .and_then(|r| r.as_i64().ok())
            .unwrap_or(0);
        Ok(raw.rem_euclid(360) as u32)
    }

    /// Height of a page's media box in points, following inherited boxes.
    pub fn page_height(&self, page: u32) -> Result<f32> {
        let page_id = self.page_id(page)?;
        Ok(media_box_height(&self.document, page_id))
    }

    // -- Editing --------------------------------------------------------------

    /// Rotate a page by `degrees` (a multiple of 90, negative turns
    /// counter-clockwise). Returns the new rotation.
    #[instrument(skip(self))]
    pub fn rotate_page(&mut self, page: u32, degrees: i32) -> Result<u32> {
        if degrees % 90 != 0 {
            return Err(TabellwerkError::PdfError(format!(
                "rotation must be a multiple of 90, got {}",
                degrees
            )));
        }

        let existing = self.rotation(page)?;
        let page_id = self.page_id(page)?;
        let new_rotation = (existing as i32 + degrees).rem_euclid(360) as u32;

        let dict = self
            .document
            .get_dictionary_mut(page_id)
            .map_err(|err| TabellwerkError::PdfError(format!("page {} dictionary: {}", page, err)))?;
        dict.set("Rotate", Object::Integer(new_rotation as i64));

        info!(page, existing, new_rotation, "Page rotated");
        Ok(new_rotation)
    }

    /// Remove a page. The last remaining page cannot be deleted.
    #[instrument(skip(self))]
    pub fn delete_page(&mut self, page: u32) -> Result<()> {
        self.page_id(page)?;
        if self.page_count() == 1 {
            return Err(TabellwerkError::LastPage);
        }
        self.document.delete_pages(&[page]);
        info!(page, remaining = self.page_count(), "Page deleted");
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the current state of the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut document = self.document.clone();
        let mut output = Vec::new();
        document
            .save_to(&mut output)
            .map_err(|err| TabellwerkError::Write(format!("failed to serialise PDF: {}", err)))?;
        Ok(output)
    }

    /// Write the current state of the document to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|err| TabellwerkError::Write(format!("{}: {}", path.as_ref().display(), err)))?;
        info!(path = %path.as_ref().display(), "PDF saved");
        Ok(())
    }

    // -- Extraction -----------------------------------------------------------

    /// Copy a single page into a new standalone PDF and return its bytes.
    #[instrument(skip(self))]
    pub fn extract_page(&self, page: u32) -> Result<Vec<u8>> {
        self.page_id(page)?;
        let mut single = self.clone();
        let others: Vec<u32> = (1..=self.page_count()).filter(|p| *p != page).collect();
        single.document.delete_pages(&others);
        single.document.prune_objects();

        let bytes = single.to_bytes()?;
        debug!(page, output_bytes = bytes.len(), "Page extracted");
        Ok(bytes)
    }

    /// Write every page to `dir/page_<n>.pdf`, returning the written paths.
    #[instrument(skip(self), fields(dir = %dir.as_ref().display()))]
    pub fn split_into_pages(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut written = Vec::with_capacity(self.page_count() as usize);
        for page in 1..=self.page_count() {
            let bytes = self.extract_page(page)?;
            let path = dir.join(format!("page_{}.pdf", page));
            std::fs::write(&path, bytes)
                .map_err(|err| TabellwerkError::Write(format!("{}: {}", path.display(), err)))?;
            written.push(path);
        }
        info!(pages = written.len(), "PDF split into pages");
        Ok(written)
    }

    /// Append the pages of each supplied PDF, in order, after this document's
    /// pages and return the combined PDF.
    #[instrument(skip_all, fields(additional_count = others.len()))]
    pub fn merge(&self, others: &[&[u8]]) -> Result<Vec<u8>> {
        info!(
            base_pages = self.page_count(),
            additional_documents = others.len(),
            "Merging PDFs"
        );

        let mut merged = self.document.clone();
        let pages_id = pages_root(&merged)?;

        for (index, other_bytes) in others.iter().enumerate() {
            let other = Document::load_mem(other_bytes).map_err(|err| {
                TabellwerkError::Unreadable(format!("additional PDF #{}: {}", index + 1, err))
            })?;

            // get_pages() is a BTreeMap, so this walks pages in order.
            for page_id in other.get_pages().into_values() {
                clone_page_into(&other, &mut merged, pages_id, page_id)?;
            }
        }

        let mut output = Vec::new();
        merged
            .save_to(&mut output)
            .map_err(|err| TabellwerkError::Write(format!("failed to serialise merged PDF: {}", err)))?;

        debug!(output_bytes = output.len(), "Merge complete");
        Ok(output)
    }

    /// Merge the files at `paths` in order and write the result to `output`.
    #[instrument(skip_all, fields(inputs = paths.len(), output = %output.as_ref().display()))]
    pub fn merge_files(paths: &[PathBuf], output: impl AsRef<Path>) -> Result<()> {
        let (first, rest) = paths
            .split_first()
            .ok_or_else(|| TabellwerkError::PdfError("no PDFs selected for merging".into()))?;

        let base = Self::open(first)?;
        let mut others = Vec::with_capacity(rest.len());
        for path in rest {
            if !path.exists() {
                return Err(TabellwerkError::NotFound(path.clone()));
            }
            others.push(std::fs::read(path)?);
        }
        let borrowed: Vec<&[u8]> = others.iter().map(Vec::as_slice).collect();

        let merged = base.merge(&borrowed)?;
        std::fs::write(output.as_ref(), merged)
            .map_err(|err| TabellwerkError::Write(format!("{}: {}", output.as_ref().display(), err)))?;
        Ok(())
    }
}

// -- Page tree helpers --------------------------------------------------------

/// Empty document with a catalog and an empty `/Pages` node.
fn skeleton() -> (Document, ObjectId) {
    let mut document = Document::with_version("1.5");
    let pages_id = document.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => Object::Integer(0),
    });
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    (document, pages_id)
}

/// Object id of the catalog's `/Pages` node.
fn pages_root(document: &Document) -> Result<ObjectId> {
    document
        .catalog()
        .map_err(|err| TabellwerkError::PdfError(format!("no catalog: {}", err)))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|err| TabellwerkError::PdfError(format!("no /Pages reference: {}", err)))
}

/// Add `page_id` to the end of `/Kids` and bump `/Count`.
fn append_kid(document: &mut Document, pages_id: ObjectId, page_id: ObjectId) {
    if let Ok(pages_dict) = document.get_dictionary_mut(pages_id) {
        if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
            kids.push(Object::Reference(page_id));
        }
        if let Ok(Object::Integer(count)) = pages_dict.get_mut(b"Count") {
            *count += 1;
        }
    }
}

/// Height of the media box for a page, walking up `/Parent` for inherited
/// boxes. Falls back to US Letter when no box is found.
pub(crate) fn media_box_height(document: &Document, page_id: ObjectId) -> f32 {
    const LETTER_HEIGHT_PT: f32 = 792.0;

    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = document.get_dictionary(id) else {
            break;
        };
        if let Ok(Object::Array(bounds)) = dict.get(b"MediaBox") {
            let values: Vec<f32> = bounds.iter().filter_map(|o| o.as_float().ok()).collect();
            if let [_, y0, _, y1] = values[..] {
                return (y1 - y0).abs();
            }
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    LETTER_HEIGHT_PT
}

/// Deep-clone a page from `source` into `target` and append it under
/// `pages_id`.
fn clone_page_into(
    source: &Document,
    target: &mut Document,
    pages_id: ObjectId,
    page_id: ObjectId,
) -> Result<()> {
    let page_object = source.get_object(page_id).map_err(|err| {
        TabellwerkError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
    })?;

    let cloned = deep_clone_object(source, target, page_object)?;
    let cloned_id = target.add_object(cloned);
    append_kid(target, pages_id, cloned_id);

    if let Ok(page_dict) = target.get_dictionary_mut(cloned_id) {
        page_dict.set("Parent", Object::Reference(pages_id));
    }
    Ok(())
}

/// Back-references that would make the clone recurse forever: `/Parent` on
/// pages and `/P` on annotations. The caller re-links `/Parent`.
fn is_back_reference(key: &[u8]) -> bool {
    key == b"Parent" || key == b"P"
}

fn deep_clone_object(source: &Document, target: &mut Document, object: &Object) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in dict.iter() {
                if is_back_reference(key) {
                    continue;
                }
                new_dict.set(key.clone(), deep_clone_object(source, target, value)?);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(items) => items
            .iter()
            .map(|item| deep_clone_object(source, target, item))
            .collect::<Result<Vec<_>>>()
            .map(Object::Array),
        Object::Reference(ref_id) => match source.get_object(*ref_id) {
            Ok(referenced) => {
                let cloned = deep_clone_object(source, target, referenced)?;
                Ok(Object::Reference(target.add_object(cloned)))
            }
            Err(err) => {
                warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                Ok(Object::Null)
            }
        },
        Object::Stream(stream) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if is_back_reference(key) {
                    continue;
                }
                new_dict.set(key.clone(), deep_clone_object(source, target, value)?);
            }
            Ok(Object::Stream(lopdf::Stream::new(new_dict, stream.content.clone())))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_document_has_requested_pages() {
        let doc = PdfDocument::blank(3, 595.0, 842.0);
        assert_eq!(doc.page_count(), 3);
        assert!((doc.page_height(2).unwrap() - 842.0).abs() < 0.01);
    }

    #[test]
    fn blank_document_survives_serialisation() {
        let bytes = PdfDocument::blank(2, 612.0, 792.0).to_bytes().unwrap();
        let reloaded = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.page_count(), 2);
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let err = PdfDocument::open("/nonexistent/nothing.pdf").err().unwrap();
        assert!(matches!(err, TabellwerkError::NotFound(_)));
    }

    #[test]
    fn open_garbage_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();
        let err = PdfDocument::open(&path).err().unwrap();
        assert!(matches!(err, TabellwerkError::Unreadable(_)));
    }

    #[test]
    fn rotation_wraps_at_full_turn() {
        let mut doc = PdfDocument::blank(1, 612.0, 792.0);
        assert_eq!(doc.rotate_page(1, 90).unwrap(), 90);
        assert_eq!(doc.rotate_page(1, 270).unwrap(), 0);
        assert_eq!(doc.rotate_page(1, -90).unwrap(), 270);
    }

    #[test]
    fn rotation_rejects_odd_angles() {
        let mut doc = PdfDocument::blank(1, 612.0, 792.0);
        assert!(doc.rotate_page(1, 45).is_err());
        assert_eq!(doc.rotation(1).unwrap(), 0);
    }

    #[test]
    fn delete_page_refuses_last_page() {
        let mut doc = PdfDocument::blank(2, 612.0, 792.0);
        doc.delete_page(1).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(matches!(doc.delete_page(1), Err(TabellwerkError::LastPage)));
    }

    #[test]
    fn extract_page_yields_single_page_pdf() {
        let doc = PdfDocument::blank(3, 612.0, 792.0);
        let bytes = doc.extract_page(2).unwrap();
        assert_eq!(PdfDocument::from_bytes(&bytes).unwrap().page_count(), 1);
        assert!(doc.extract_page(4).is_err());
    }

    #[test]
    fn merge_appends_pages_in_order() {
        let base = PdfDocument::blank(2, 612.0, 792.0);
        let extra = PdfDocument::blank(3, 595.0, 842.0).to_bytes().unwrap();
        let merged = base.merge(&[&extra]).unwrap();
        let merged = PdfDocument::from_bytes(&merged).unwrap();
        assert_eq!(merged.page_count(), 5);
        assert!((merged.page_height(5).unwrap() - 842.0).abs() < 0.01);
    }

    #[test]
    fn split_writes_one_file_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let doc = PdfDocument::blank(3, 612.0, 792.0);
        let written = doc.split_into_pages(dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("page_3.pdf").exists());
    }
}
