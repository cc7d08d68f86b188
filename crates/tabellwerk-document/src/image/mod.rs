// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: viewport fitting, encoding, and analysis overlays.

pub mod overlay;
pub mod processor;

pub use overlay::{ocr_preprocess, table_line_overlay};
pub use processor::ImageProcessor;
