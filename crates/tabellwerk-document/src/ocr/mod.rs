// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optical character recognition. The engine needs the `ocr` feature; the
// word-to-cell layout is always available.

#[cfg(feature = "ocr")]
pub mod engine;
pub mod layout;

#[cfg(feature = "ocr")]
pub use engine::{OcrConfig, OcrEngine};
pub use layout::{OcrWord, words_to_cells};
