// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engine built on `ocrs`, a pure-Rust recogniser running neural models
// through `rten`.
//
// Two model files are required, `text-detection.rten` and
// `text-recognition.rten`. Running `ocrs-cli` once downloads them into
// `$XDG_CACHE_HOME/ocrs` (usually `~/.cache/ocrs`), which is the default
// location. `AppConfig::ocr_model_dir` overrides it.
//
// ocrs and rten must be built in release mode; debug builds are one to two
// orders of magnitude slower.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, OcrInput, TextItem};
use rten::Model;
use tabellwerk_core::error::{Result, TabellwerkError};
use tracing::{debug, info, instrument};

use super::layout::{OcrWord, words_to_cells};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where the two model files live.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Configured directory, or the ocrs cache when none is set.
    pub fn from_optional_dir(dir: Option<&Path>) -> Self {
        dir.map(Self::from_dir).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(TabellwerkError::OcrError(format!(
                    "model not found at {}; run `ocrs-cli` once to download the models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Loaded OCR models. Construction is the slow part; reuse one engine for
/// every page of a conversion.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    #[instrument(skip_all, fields(detection = %config.detection_model_path.display()))]
    pub fn new(config: &OcrConfig) -> Result<Self> {
        config.validate()?;

        let load = |path: &Path| {
            Model::load_file(path).map_err(|err| {
                TabellwerkError::OcrError(format!("failed to load model {}: {}", path.display(), err))
            })
        };
        let detection_model = load(&config.detection_model_path)?;
        let recognition_model = load(&config.recognition_model_path)?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| TabellwerkError::OcrError(format!("failed to initialise OCR engine: {}", err)))?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    fn prepare(&self, image: &DynamicImage) -> Result<OcrInput> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            TabellwerkError::OcrError(format!("bad image source ({}x{}): {}", width, height, err))
        })?;
        self.engine
            .prepare_input(source)
            .map_err(|err| TabellwerkError::OcrError(format!("OCR preprocessing failed: {}", err)))
    }

    /// All text on the page, one line per recognised line.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let input = self.prepare(image)?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| TabellwerkError::OcrError(format!("recognition failed: {}", err)))?;
        debug!(lines = text.lines().count(), "Text recognised");
        Ok(text)
    }

    /// Recognised lines as table rows, split into cells at wide word gaps.
    /// Lines with no readable words are dropped.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_rows(&self, image: &DynamicImage) -> Result<Vec<Vec<String>>> {
        let input = self.prepare(image)?;
        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| TabellwerkError::OcrError(format!("word detection failed: {}", err)))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| TabellwerkError::OcrError(format!("line recognition failed: {}", err)))?;

        let rows: Vec<Vec<String>> = lines
            .iter()
            .flatten()
            .map(|line| {
                let words: Vec<OcrWord> = line
                    .words()
                    .map(|word| {
                        let rect = word.bounding_rect();
                        OcrWord::new(word.to_string(), rect.left() as f32, rect.right() as f32)
                    })
                    .collect();
                words_to_cells(&words)
            })
            .filter(|cells| !cells.is_empty())
            .collect();

        debug!(lines = line_rects.len(), rows = rows.len(), "Rows recognised");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_dir_uses_well_known_names() {
        let config = OcrConfig::from_dir("/tmp/models");
        assert_eq!(config.detection_model_path, PathBuf::from("/tmp/models/text-detection.rten"));
        assert_eq!(config.recognition_model_path, PathBuf::from("/tmp/models/text-recognition.rten"));
    }

    #[test]
    fn optional_dir_falls_back_to_cache() {
        assert_eq!(OcrConfig::from_optional_dir(None), OcrConfig::default());
    }

    #[test]
    fn missing_models_fail_validation() {
        let config = OcrConfig::from_dir("/nonexistent/ocr-models");
        assert!(matches!(config.validate(), Err(TabellwerkError::OcrError(_))));
        assert!(OcrEngine::new(&config).is_err());
    }
}
