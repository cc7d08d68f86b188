// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Tabellwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Tabellwerk operations.
#[derive(Debug, Error)]
pub enum TabellwerkError {
    // -- Document session --
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("document cannot be read: {0}")]
    Unreadable(String),

    #[error("page {page} out of range (document has {page_count} pages)")]
    OutOfRange { page: u32, page_count: u32 },

    #[error("{0:?} is not a page number")]
    NotAPageNumber(String),

    #[error("cannot delete the only remaining page")]
    LastPage,

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Extraction --
    #[error("invalid page selection {selection:?}: {reason}")]
    InvalidPageSelection { selection: String, reason: String },

    #[error("table extraction failed: {0}")]
    Extraction(String),

    #[error("external tool `{tool}` is unavailable: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    #[error("a conversion is already running")]
    ConversionBusy,

    // -- Export --
    #[error("no tables to export")]
    NothingToExport,

    #[error(
        "table {table} has {actual} columns but the shared header has {expected}; \
         refusing to concatenate"
    )]
    SchemaMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("cannot write output: {0}")]
    Write(String),

    // -- Activation --
    #[error("activation key is empty")]
    EmptyActivationKey,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("feature not compiled into this build: {0}")]
    FeatureUnavailable(&'static str),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TabellwerkError>;
