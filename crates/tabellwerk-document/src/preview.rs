// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page preview rendering. Rasterisation is delegated to a `PageRasterizer`;
// the default one shells out to poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tabellwerk_core::error::{Result, TabellwerkError};
use tracing::{debug, instrument};

use crate::image::ImageProcessor;
use crate::session::DocumentSession;

/// Turns one page of a PDF into a bitmap.
pub trait PageRasterizer: Send + Sync {
    /// Rasterise 1-based `page` of the PDF in `pdf` at `dpi`.
    fn rasterize(&self, pdf: &[u8], page: u32, dpi: u32) -> Result<DynamicImage>;

    /// Same as [`rasterize`](Self::rasterize) for a PDF on disk.
    fn rasterize_file(&self, path: &Path, page: u32, dpi: u32) -> Result<DynamicImage> {
        if !path.exists() {
            return Err(TabellwerkError::NotFound(path.to_path_buf()));
        }
        self.rasterize(&std::fs::read(path)?, page, dpi)
    }
}

/// Rasteriser backed by poppler-utils' `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    program: PathBuf,
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PopplerRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PageRasterizer for PopplerRasterizer {
    #[instrument(skip(self, pdf), fields(program = %self.program.display(), bytes = pdf.len()))]
    fn rasterize(&self, pdf: &[u8], page: u32, dpi: u32) -> Result<DynamicImage> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.pdf");
        std::fs::write(&input, pdf)?;
        let prefix = workdir.path().join("page");

        let output = Command::new(&self.program)
            .arg("-png")
            .args(["-r", &dpi.to_string()])
            .args(["-f", &page.to_string(), "-l", &page.to_string()])
            .arg("-singlefile")
            .arg(&input)
            .arg(&prefix)
            .output()
            .map_err(|err| TabellwerkError::ToolUnavailable {
                tool: self.program.display().to_string(),
                reason: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(TabellwerkError::Render(format!(
                "pdftoppm failed on page {}: {}",
                page,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let png = prefix.with_extension("png");
        let image = image::open(&png)
            .map_err(|err| TabellwerkError::Render(format!("unreadable pdftoppm output: {}", err)))?;
        debug!(width = image.width(), height = image.height(), "Page rasterised");
        Ok(image)
    }
}

/// Produces the bitmap shown in the viewer.
///
/// Rendering is a pure function of its inputs; nothing is cached here.
pub struct PreviewRenderer<R> {
    rasterizer: R,
    base_dpi: u32,
}

impl<R: PageRasterizer> PreviewRenderer<R> {
    /// `base_dpi` is the resolution used at zoom 1.0.
    pub fn new(rasterizer: R, base_dpi: u32) -> Self {
        Self {
            rasterizer,
            base_dpi: base_dpi.max(1),
        }
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Resolution for a given zoom factor.
    pub fn dpi_for(&self, zoom: f32) -> u32 {
        ((self.base_dpi as f32 * zoom).round() as u32).max(1)
    }

    /// Render `page` of the session at `zoom`. An override bitmap (an overlay
    /// the user switched on) is returned as-is.
    #[instrument(skip(self, session, override_bitmap), fields(page, zoom))]
    pub fn render(
        &self,
        session: &DocumentSession,
        page: u32,
        zoom: f32,
        override_bitmap: Option<&DynamicImage>,
    ) -> Result<DynamicImage> {
        if let Some(bitmap) = override_bitmap {
            return Ok(bitmap.clone());
        }
        if page == 0 || page > session.page_count() {
            return Err(TabellwerkError::OutOfRange {
                page,
                page_count: session.page_count(),
            });
        }
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(TabellwerkError::Render(format!("invalid zoom level {zoom}")));
        }
        self.rasterizer
            .rasterize(&session.to_bytes()?, page, self.dpi_for(zoom))
    }
}

/// Scale `bitmap` to fit a `width` x `height` viewport, keeping its aspect
/// ratio. Viewports of one pixel or less return the bitmap unchanged.
pub fn fit_to_viewport(bitmap: DynamicImage, width: u32, height: u32) -> DynamicImage {
    ImageProcessor::from_dynamic(bitmap)
        .fit_within(width, height)
        .into_dynamic()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use image::{Rgb, RgbImage};

    use super::*;
    use crate::session::tests::session;

    /// Returns a blank bitmap sized from the requested DPI and records calls.
    #[derive(Default)]
    pub(crate) struct FakeRasterizer {
        pub calls: Mutex<Vec<(u32, u32)>>,
    }

    impl PageRasterizer for FakeRasterizer {
        fn rasterize(&self, pdf: &[u8], page: u32, dpi: u32) -> Result<DynamicImage> {
            assert!(pdf.starts_with(b"%PDF"));
            self.calls.lock().unwrap().push((page, dpi));
            // US Letter is 8.5 x 11 inches.
            let (w, h) = ((8.5 * dpi as f32) as u32, (11.0 * dpi as f32) as u32);
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))))
        }
    }

    #[test]
    fn render_scales_dpi_with_zoom() {
        let renderer = PreviewRenderer::new(FakeRasterizer::default(), 72);
        let s = session(2);
        let bitmap = renderer.render(&s, 2, 2.0, None).unwrap();
        assert_eq!(bitmap.width(), 1224);
        assert_eq!(*renderer.rasterizer().calls.lock().unwrap(), vec![(2, 144)]);
    }

    #[test]
    fn override_bitmap_skips_rasterisation() {
        let renderer = PreviewRenderer::new(FakeRasterizer::default(), 72);
        let overlay = DynamicImage::ImageRgb8(RgbImage::new(3, 4));
        let bitmap = renderer.render(&session(1), 1, 1.0, Some(&overlay)).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (3, 4));
        assert!(renderer.rasterizer().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn render_rejects_bad_page_and_zoom() {
        let renderer = PreviewRenderer::new(FakeRasterizer::default(), 72);
        let s = session(1);
        assert!(matches!(
            renderer.render(&s, 2, 1.0, None),
            Err(TabellwerkError::OutOfRange { .. })
        ));
        assert!(renderer.render(&s, 1, 0.0, None).is_err());
    }

    #[test]
    fn fit_to_viewport_keeps_aspect() {
        let bitmap = DynamicImage::ImageRgb8(RgbImage::new(612, 792));
        let fitted = fit_to_viewport(bitmap, 306, 1000);
        assert_eq!((fitted.width(), fitted.height()), (306, 396));
    }

    #[test]
    fn export_page_image_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("page.png");
        session(2)
            .export_page_image(&FakeRasterizer::default(), 2, 10, &out)
            .unwrap();
        let written = image::open(&out).unwrap();
        assert_eq!((written.width(), written.height()), (85, 110));
    }

    #[test]
    fn missing_pdftoppm_is_tool_unavailable() {
        let rasterizer = PopplerRasterizer::new("/nonexistent/pdftoppm");
        let pdf = session(1).to_bytes().unwrap();
        assert!(matches!(
            rasterizer.rasterize(&pdf, 1, 72),
            Err(TabellwerkError::ToolUnavailable { .. })
        ));
    }
}
