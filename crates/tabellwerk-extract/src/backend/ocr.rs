// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR backend for scanned PDFs with no text layer. Each page becomes one
// table whose rows are the recognised text lines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tabellwerk_core::error::Result;
use tabellwerk_core::{Backend, DetectOptions, Table};
use tabellwerk_document::PageRasterizer;
use tabellwerk_document::ocr::{OcrConfig, OcrEngine};
use tracing::{debug, info, instrument};

use super::TableBackend;

/// Resolution pages are rasterised at before recognition.
pub const OCR_DPI: u32 = 300;

pub struct OcrBackend {
    rasterizer: Arc<dyn PageRasterizer>,
    model_dir: Option<PathBuf>,
}

impl OcrBackend {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, model_dir: Option<PathBuf>) -> Self {
        Self {
            rasterizer,
            model_dir,
        }
    }
}

impl TableBackend for OcrBackend {
    fn kind(&self) -> Backend {
        Backend::Ocr
    }

    #[instrument(skip(self, pages, _options), fields(pdf = %pdf.display(), pages = pages.len()))]
    fn extract(&self, pdf: &Path, pages: &[u32], _options: DetectOptions) -> Result<Vec<Table>> {
        let engine = OcrEngine::new(&OcrConfig::from_optional_dir(self.model_dir.as_deref()))?;
        let bytes = std::fs::read(pdf)?;

        let mut tables = Vec::with_capacity(pages.len());
        for &page in pages {
            let bitmap = self.rasterizer.rasterize(&bytes, page, OCR_DPI)?;
            let rows = engine.recognize_rows(&bitmap)?;
            debug!(page, rows = rows.len(), "Page recognised");
            tables.push(Table::new(String::new(), Some(page), rows));
        }
        info!(tables = tables.len(), "OCR extraction finished");
        Ok(tables)
    }
}
