// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table extraction facade: validates the request, picks the backend for the
// chosen engine, and normalises what comes back.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{AppConfig, Backend, DetectOptions, Engine, ExtractionResult, PageSelection, Table};
use tabellwerk_document::PdfDocument;
use tracing::{debug, info, instrument};

use crate::backend::{CamelotBackend, TableBackend, TabulaBackend};
use crate::pages;

/// Runs table extraction through whichever backends are registered.
#[derive(Clone, Default)]
pub struct Extractor {
    backends: HashMap<Backend, Arc<dyn TableBackend>>,
}

impl Extractor {
    /// Backends wired to the external tools named in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let tools = &config.tools;
        let extractor = Self::default()
            .with_backend(Arc::new(TabulaBackend::new(&tools.java, tools.tabula_jar.clone())))
            .with_backend(Arc::new(CamelotBackend::new(&tools.camelot)));

        #[cfg(feature = "ocr")]
        let extractor = extractor.with_backend(Arc::new(crate::backend::OcrBackend::new(
            Arc::new(tabellwerk_document::PopplerRasterizer::new(&tools.pdftoppm)),
            config.ocr_model_dir.clone(),
        )));

        extractor
    }

    /// Register (or replace) the backend for its kind.
    pub fn with_backend(mut self, backend: Arc<dyn TableBackend>) -> Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    fn backend(&self, kind: Backend) -> Result<&Arc<dyn TableBackend>> {
        self.backends.get(&kind).ok_or_else(|| match kind {
            Backend::Ocr => TabellwerkError::FeatureUnavailable("ocr"),
            other => TabellwerkError::ToolUnavailable {
                tool: other.to_string(),
                reason: "backend not registered".into(),
            },
        })
    }

    /// Extract tables from the selected pages of `path`.
    ///
    /// Finding no tables is a successful, empty result.
    #[instrument(skip(self, options), fields(path = %path.display(), engine = engine.label()))]
    pub fn extract(
        &self,
        path: &Path,
        selection: &PageSelection,
        engine: Engine,
        options: DetectOptions,
    ) -> Result<ExtractionResult> {
        let page_count = PdfDocument::open(path)?.page_count();
        let page_list = pages::resolve(selection, page_count)?;
        let kind = engine.backend();
        let backend = self.backend(kind)?;

        debug!(backend = %kind, pages = ?page_list, "Dispatching to backend");
        let raw = backend.extract(path, &page_list, options)?;
        let tables = normalize(raw);

        info!(backend = %kind, tables = tables.len(), "Extraction complete");
        Ok(ExtractionResult::new(kind, tables))
    }
}

/// Trim cells, drop blank rows and empty tables, and name the survivors
/// `Table_1`, `Table_2`, ... in order.
pub fn normalize(raw: Vec<Table>) -> Vec<Table> {
    raw.into_iter()
        .map(|table| {
            let rows: Vec<Vec<String>> = table
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.trim().to_string()).collect::<Vec<_>>())
                .filter(|row| row.iter().any(|cell| !cell.is_empty()))
                .collect();
            Table { rows, ..table }
        })
        .filter(|table| !table.is_empty())
        .enumerate()
        .map(|(i, table)| Table {
            name: format!("Table_{}", i + 1),
            ..table
        })
        .collect()
}
