// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tabellwerk-extract: PDF tables to spreadsheets.
//
// Page selection parsing, the external-tool backends (tabula, camelot, and OCR
// behind the `ocr` feature), the extraction facade that normalises their
// output, the XLSX/CSV writer, and the single-flight conversion dispatcher.

pub mod backend;
pub mod export;
pub mod orchestrator;
pub mod pages;
pub mod task;

pub use backend::TableBackend;
pub use export::{ExportWriter, default_output_path};
pub use orchestrator::Extractor;
pub use task::{ConversionDispatcher, ConversionOutcome, ConversionRequest, Converter};
