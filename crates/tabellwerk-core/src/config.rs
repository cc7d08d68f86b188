// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration and persisted converter settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{DetectOptions, Engine, OutputFormat};

/// File name of the persisted converter settings, kept from earlier releases.
pub const SETTINGS_FILE: &str = "pdf_converter_settings.json";

/// File name of the application configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Locations of the external programs Tabellwerk drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Java runtime used to launch tabula.
    pub java: PathBuf,
    /// Path to the tabula-java jar (`tabula-<version>-jar-with-dependencies.jar`).
    pub tabula_jar: Option<PathBuf>,
    /// The `camelot` command-line entry point.
    pub camelot: PathBuf,
    /// Poppler's `pdftoppm`, used for page rasterisation.
    pub pdftoppm: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            java: PathBuf::from("java"),
            tabula_jar: None,
            camelot: PathBuf::from("camelot"),
            pdftoppm: PathBuf::from("pdftoppm"),
        }
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tools: ToolPaths,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    /// `None` uses the ocrs cache directory.
    pub ocr_model_dir: Option<PathBuf>,
    /// Rasterisation resolution at zoom 1.0.
    pub preview_dpi: u32,
    /// Paper size for generated (searchable) PDFs.
    pub paper_size: crate::PaperSize,
    /// Maximum number of undo snapshots kept per document.
    pub undo_depth: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            ocr_model_dir: None,
            preview_dpi: 72,
            paper_size: crate::PaperSize::A4,
            undo_depth: 50,
        }
    }
}

impl AppConfig {
    /// Load from `dir/config.json`, falling back to defaults when missing or
    /// malformed.
    pub fn load_or_default(dir: &Path) -> Self {
        load_json(&dir.join(CONFIG_FILE)).unwrap_or_default()
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        save_json(&dir.join(CONFIG_FILE), self)
    }
}

/// Conversion options remembered between runs.
///
/// The JSON shape `{engine, lattice, stream, format}` is shared with files
/// written by earlier versions of the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterSettings {
    pub engine: Engine,
    /// Detect bordered (ruled) tables.
    pub lattice: bool,
    /// Detect borderless (whitespace-aligned) tables.
    pub stream: bool,
    pub format: OutputFormat,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            engine: Engine::Auto,
            lattice: true,
            stream: true,
            format: OutputFormat::Spreadsheet,
        }
    }
}

impl ConverterSettings {
    pub fn detect_options(&self) -> DetectOptions {
        DetectOptions {
            detect_bordered: self.lattice,
            detect_borderless: self.stream,
        }
    }

    pub fn load_or_default(dir: &Path) -> Self {
        load_json(&dir.join(SETTINGS_FILE)).unwrap_or_default()
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        save_json(&dir.join(SETTINGS_FILE), self)
    }
}

/// Read and deserialize a JSON file. Missing or malformed files yield `None`.
pub fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed JSON file");
            None
        }
    }
}

/// Serialize `value` as pretty JSON to `path`.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "JSON file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_read_legacy_shape() {
        let legacy = r#"{"engine": "Camelot", "lattice": true, "stream": false, "format": "csv"}"#;
        let settings: ConverterSettings = serde_json::from_str(legacy).unwrap();
        assert_eq!(settings.engine, Engine::Camelot);
        assert!(settings.lattice);
        assert!(!settings.stream);
        assert_eq!(settings.format, OutputFormat::DelimitedText);
    }

    #[test]
    fn settings_write_legacy_keys() {
        let value = serde_json::to_value(ConverterSettings::default()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["engine", "format", "lattice", "stream"]);
        assert_eq!(obj["format"], "xlsx");
    }

    #[test]
    fn settings_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ConverterSettings {
            engine: Engine::Ocr,
            lattice: false,
            stream: true,
            format: OutputFormat::DelimitedText,
        };
        settings.save(dir.path()).unwrap();
        assert_eq!(ConverterSettings::load_or_default(dir.path()), settings);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();
        assert_eq!(AppConfig::load_or_default(dir.path()), AppConfig::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"preview_dpi": 150}"#).unwrap();
        assert_eq!(config.preview_dpi, 150);
        assert_eq!(config.undo_depth, 50);
        assert_eq!(config.tools.pdftoppm, PathBuf::from("pdftoppm"));
    }
}
