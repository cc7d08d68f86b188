// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Viewer bitmaps: rendering the current page into a `data:` URL the webview
// can show, and the table-line / OCR-preprocess overlays.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::DynamicImage;
use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_document::image::{ocr_preprocess, table_line_overlay};
use tabellwerk_document::{
    DocumentSession, ImageProcessor, PageRasterizer, PreviewRenderer, fit_to_viewport,
};

use crate::state::{AppState, overlay_bitmap};

/// PDF user space is 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    TableLines,
    OcrPreprocess,
}

impl OverlayKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TableLines => "Table lines",
            Self::OcrPreprocess => "OCR preview",
        }
    }
}

/// A processed bitmap of one page, shown in place of the plain render.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub page: u32,
    pub bitmap: DynamicImage,
}

/// Encode a bitmap as a PNG `data:` URL.
pub fn png_data_url(bitmap: &DynamicImage) -> Result<String> {
    let png = ImageProcessor::from_dynamic(bitmap.clone()).to_png_bytes()?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}

/// Build an overlay for the session's current page at its current zoom.
pub fn build_overlay<R: PageRasterizer>(
    renderer: &PreviewRenderer<R>,
    session: &DocumentSession,
    kind: OverlayKind,
) -> Result<Overlay> {
    let page = session.current_page();
    let bitmap = renderer.render(session, page, session.zoom(), None)?;
    let bitmap = match kind {
        OverlayKind::TableLines => table_line_overlay(&bitmap),
        OverlayKind::OcrPreprocess => ocr_preprocess(&bitmap),
    };
    Ok(Overlay { kind, page, bitmap })
}

/// Re-render the viewer bitmap, scaled to fit the viewport with its aspect
/// ratio kept. Overlays for a page other than the current one are discarded
/// first.
pub fn refresh<R: PageRasterizer>(state: &mut AppState, renderer: &PreviewRenderer<R>) -> Result<()> {
    let Some(page) = state.current_page() else {
        state.preview = None;
        return Ok(());
    };
    if state.overlay.as_ref().is_some_and(|o| o.page != page) {
        state.overlay = None;
    }

    let (url, scale) = {
        let Some(session) = state.session.as_ref() else {
            return Ok(());
        };
        let rendered = renderer.render(session, page, session.zoom(), overlay_bitmap(state))?;
        let rendered_width = rendered.width().max(1);
        let (width, height) = state.viewport;
        let bitmap = fit_to_viewport(rendered, width, height);
        let fit = bitmap.width() as f32 / rendered_width as f32;
        (
            png_data_url(&bitmap)?,
            renderer.dpi_for(session.zoom()) as f32 / POINTS_PER_INCH * fit,
        )
    };
    state.preview = Some(url);
    state.preview_scale = scale;
    Ok(())
}

/// Convert a click in preview pixels into page points.
pub fn to_page_point(state: &AppState, x: f64, y: f64) -> Result<tabellwerk_core::Point> {
    if state.preview_scale <= 0.0 {
        return Err(TabellwerkError::Render("preview has no scale".into()));
    }
    Ok(tabellwerk_core::Point::new(
        x as f32 / state.preview_scale,
        y as f32 / state.preview_scale,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tabellwerk_document::PdfDocument;

    /// Returns a white bitmap sized from the DPI so scale is observable.
    struct WhitePage;

    impl PageRasterizer for WhitePage {
        fn rasterize(&self, _pdf: &[u8], _page: u32, dpi: u32) -> Result<DynamicImage> {
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                dpi,
                dpi,
                Rgba([255, 255, 255, 255]),
            )))
        }
    }

    fn state_with(pages: u32) -> AppState {
        let mut state = AppState::new(10);
        let session =
            DocumentSession::from_document("t.pdf", PdfDocument::blank(pages, 612.0, 792.0)).unwrap();
        state.open(session, 10);
        state
    }

    #[test]
    fn refresh_produces_png_data_url() {
        let mut state = state_with(2);
        state.set_viewport(144, 144);
        let renderer = PreviewRenderer::new(WhitePage, 144);
        refresh(&mut state, &renderer).unwrap();
        assert!(state.preview.as_deref().unwrap().starts_with("data:image/png;base64,"));
        assert!((state.preview_scale - 2.0).abs() < f32::EPSILON);
    }

    fn decoded_size(url: &str) -> (u32, u32) {
        let b64 = url.trim_start_matches("data:image/png;base64,");
        let png = BASE64.decode(b64).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn refresh_fits_the_viewport() {
        let mut state = state_with(1);
        state.set_viewport(300, 200);
        // 288 dpi gives a 288x288 render; it must shrink to 200x200.
        let renderer = PreviewRenderer::new(WhitePage, 288);
        refresh(&mut state, &renderer).unwrap();
        let (w, h) = decoded_size(state.preview.as_deref().unwrap());
        assert!(w <= 300 && h <= 200, "{w}x{h} exceeds the viewport");
        assert_eq!((w, h), (200, 200));
        // 4 px per point rendered, scaled by 200/288.
        assert!((state.preview_scale - 4.0 * 200.0 / 288.0).abs() < 1e-4);
        let p = to_page_point(&state, 100.0, 100.0).unwrap();
        assert!((p.x - 36.0).abs() < 1e-3);
    }

    #[test]
    fn overlay_is_dropped_after_navigation() {
        let mut state = state_with(2);
        let renderer = PreviewRenderer::new(WhitePage, 72);
        let overlay = build_overlay(&renderer, state.session.as_ref().unwrap(), OverlayKind::TableLines).unwrap();
        state.overlay = Some(overlay);
        refresh(&mut state, &renderer).unwrap();
        assert!(state.overlay.is_some());

        state.session.as_mut().unwrap().next();
        refresh(&mut state, &renderer).unwrap();
        assert!(state.overlay.is_none());
    }

    #[test]
    fn clicks_map_to_points() {
        let mut state = state_with(1);
        state.preview_scale = 2.0;
        let p = to_page_point(&state, 200.0, 100.0).unwrap();
        assert_eq!(p, tabellwerk_core::Point::new(100.0, 50.0));
    }
}
