// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The open document: page navigation, page edits, zoom, and saving.

use std::path::{Path, PathBuf};

use tabellwerk_core::Annotation;
use tabellwerk_core::error::{Result, TabellwerkError};
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;
use crate::pdf::{PdfDocument, apply_annotations};
use crate::preview::PageRasterizer;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;
pub const ZOOM_STEP: f32 = 1.2;

/// State of the currently open PDF. Opening another file replaces it.
///
/// `current_page` always satisfies `1 <= current_page <= page_count`.
#[derive(Clone)]
pub struct DocumentSession {
    path: PathBuf,
    pdf: PdfDocument,
    current_page: u32,
    zoom: f32,
}

impl DocumentSession {
    /// Open a PDF. Fails with `NotFound`, or `Unreadable` for files that are
    /// not PDFs or have no pages.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pdf = PdfDocument::open(path)?;
        if pdf.page_count() == 0 {
            return Err(TabellwerkError::Unreadable(format!(
                "{} has no pages",
                path.display()
            )));
        }
        info!(pages = pdf.page_count(), "Document opened");
        Ok(Self {
            path: path.to_path_buf(),
            pdf,
            current_page: 1,
            zoom: 1.0,
        })
    }

    /// Wrap an already-loaded document, for callers that build PDFs in memory.
    pub fn from_document(path: impl Into<PathBuf>, pdf: PdfDocument) -> Result<Self> {
        let path = path.into();
        if pdf.page_count() == 0 {
            return Err(TabellwerkError::Unreadable(format!("{} has no pages", path.display())));
        }
        Ok(Self {
            path,
            pdf,
            current_page: 1,
            zoom: 1.0,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> u32 {
        self.pdf.page_count()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn document(&self) -> &PdfDocument {
        &self.pdf
    }

    pub fn rotation(&self, page: u32) -> Result<u32> {
        self.pdf.rotation(page)
    }

    fn check_page(&self, page: u32) -> Result<()> {
        if page == 0 || page > self.page_count() {
            return Err(TabellwerkError::OutOfRange {
                page,
                page_count: self.page_count(),
            });
        }
        Ok(())
    }

    // -- Navigation -----------------------------------------------------------

    /// Jump to `page`. On failure the current page is left alone.
    pub fn goto(&mut self, page: u32) -> Result<()> {
        self.check_page(page)?;
        self.current_page = page;
        debug!(page, "Moved to page");
        Ok(())
    }

    /// Advance one page; no-op on the last page.
    pub fn next(&mut self) {
        if self.current_page < self.page_count() {
            self.current_page += 1;
        }
    }

    /// Go back one page; no-op on the first page.
    pub fn prev(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    // -- Page edits -----------------------------------------------------------

    pub fn delete_page(&mut self, page: u32) -> Result<()> {
        self.check_page(page)?;
        self.pdf.delete_page(page)?;
        self.current_page = self.current_page.min(self.page_count());
        Ok(())
    }

    /// Rotate `page` by a multiple of 90 degrees. Returns the new rotation.
    pub fn rotate_page(&mut self, page: u32, degrees: i32) -> Result<u32> {
        self.check_page(page)?;
        self.pdf.rotate_page(page, degrees)
    }

    // -- Zoom -----------------------------------------------------------------

    pub fn zoom_in(&mut self) -> f32 {
        self.zoom = (self.zoom * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.zoom = (self.zoom / ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom
    }

    /// Set an explicit zoom. Non-positive or non-finite values are rejected;
    /// the rest are clamped to the supported range.
    pub fn set_zoom(&mut self, zoom: f32) -> Result<f32> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(TabellwerkError::Render(format!("invalid zoom level {zoom}")));
        }
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        Ok(self.zoom)
    }

    // -- Output ---------------------------------------------------------------

    /// Current edited state as PDF bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.pdf.to_bytes()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.pdf.save(path)
    }

    /// Save a copy with the given annotations merged in. The session itself is
    /// not modified. Returns the number of annotations written.
    #[instrument(skip(self, annotations), fields(count = annotations.len(), path = %path.as_ref().display()))]
    pub fn save_with_annotations(&self, annotations: &[Annotation], path: impl AsRef<Path>) -> Result<usize> {
        let mut copy = self.pdf.clone();
        let written = apply_annotations(&mut copy, annotations)?;
        copy.save(path)?;
        Ok(written)
    }

    /// Rasterise `page` at `dpi` and write it as PNG or JPEG by extension.
    #[instrument(skip(self, rasterizer), fields(path = %path.as_ref().display()))]
    pub fn export_page_image(
        &self,
        rasterizer: &dyn PageRasterizer,
        page: u32,
        dpi: u32,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        self.check_page(page)?;
        let bitmap = rasterizer.rasterize(&self.to_bytes()?, page, dpi)?;
        ImageProcessor::from_dynamic(bitmap).save(path.as_ref())?;
        info!(page, dpi, "Page exported as image");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Session over an in-memory document of `pages` Letter pages.
    pub(crate) fn session(pages: u32) -> DocumentSession {
        DocumentSession::from_document("test.pdf", PdfDocument::blank(pages, 612.0, 792.0)).unwrap()
    }

    #[test]
    fn open_resets_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        PdfDocument::blank(3, 612.0, 792.0).save(&path).unwrap();

        let session = DocumentSession::open(&path).unwrap();
        assert_eq!(session.page_count(), 3);
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.zoom(), 1.0);
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(matches!(
            DocumentSession::open("/nonexistent/x.pdf"),
            Err(TabellwerkError::NotFound(_))
        ));
    }

    #[test]
    fn goto_validates_range_and_keeps_state() {
        let mut s = session(3);
        assert!(matches!(
            s.goto(5),
            Err(TabellwerkError::OutOfRange { page: 5, page_count: 3 })
        ));
        assert_eq!(s.current_page(), 1);
        assert!(s.goto(0).is_err());
        s.goto(2).unwrap();
        assert_eq!(s.current_page(), 2);
    }

    #[test]
    fn next_and_prev_clamp_at_edges() {
        let mut s = session(2);
        s.prev();
        assert_eq!(s.current_page(), 1);
        s.next();
        s.next();
        s.next();
        assert_eq!(s.current_page(), 2);
        s.prev();
        assert_eq!(s.current_page(), 1);
    }

    #[test]
    fn four_quarter_turns_restore_rotation() {
        let mut s = session(1);
        for _ in 0..4 {
            s.rotate_page(1, 90).unwrap();
        }
        assert_eq!(s.rotation(1).unwrap(), 0);
    }

    #[test]
    fn deleting_current_last_page_reclamps() {
        let mut s = session(3);
        s.goto(3).unwrap();
        s.delete_page(3).unwrap();
        assert_eq!(s.page_count(), 2);
        assert_eq!(s.current_page(), 2);
    }

    #[test]
    fn deleting_only_page_is_refused() {
        let mut s = session(1);
        assert!(matches!(s.delete_page(1), Err(TabellwerkError::LastPage)));
        assert_eq!(s.page_count(), 1);
    }

    #[test]
    fn zoom_stays_within_bounds() {
        let mut s = session(1);
        assert!((s.zoom_in() - 1.2).abs() < 1e-6);
        for _ in 0..100 {
            s.zoom_in();
        }
        assert_eq!(s.zoom(), MAX_ZOOM);
        for _ in 0..200 {
            s.zoom_out();
        }
        assert_eq!(s.zoom(), MIN_ZOOM);
        assert!(s.set_zoom(0.0).is_err());
        assert!(s.set_zoom(-1.0).is_err());
        assert_eq!(s.set_zoom(2.5).unwrap(), 2.5);
    }

    #[test]
    fn save_with_annotations_leaves_session_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("annotated.pdf");
        let s = session(2);
        let marks = [Annotation::highlight(2, tabellwerk_core::Point::new(10.0, 10.0))];

        assert_eq!(s.save_with_annotations(&marks, &out).unwrap(), 1);
        assert_eq!(PdfDocument::open(&out).unwrap().page_count(), 2);
        let page_id = s.document().page_id(2).unwrap();
        assert!(s.document().inner().get_dictionary(page_id).unwrap().get(b"Annots").is_err());
    }
}
