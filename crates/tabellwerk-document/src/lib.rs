// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tabellwerk-document: everything that happens to the open PDF.
//
// Holds the document session (navigation, page edits, zoom, save), the
// annotation store with undo, preview rendering through a pluggable page
// rasteriser, PDF merge/split/annotate, image helpers and overlays, and OCR
// behind the `ocr` feature.

pub mod annotation;
pub mod image;
pub mod ocr;
pub mod pdf;
pub mod preview;
pub mod session;

pub use annotation::AnnotationStore;
pub use image::ImageProcessor;
pub use pdf::{PdfDocument, TextPdfWriter};
pub use preview::{PageRasterizer, PopplerRasterizer, PreviewRenderer, fit_to_viewport};
pub use session::DocumentSession;

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
