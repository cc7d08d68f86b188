// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tabellwerk: Core types, errors, and settings shared across all crates.

pub mod activation;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::{AppConfig, ConverterSettings};
pub use error::TabellwerkError;
pub use types::*;
