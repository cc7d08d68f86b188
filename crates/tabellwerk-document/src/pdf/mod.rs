// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page editing, annotation merge, merge/split, and text PDF output.

pub mod annotate;
pub mod document;
pub mod writer;

pub use annotate::apply_annotations;
pub use document::PdfDocument;
pub use writer::{TextPdfWriter, searchable_output_path};
