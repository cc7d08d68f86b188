// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: owns configuration, persisted settings, and the
// conversion dispatcher, and exposes them to every page through
// `use_context::<AppServices>()`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tabellwerk_core::activation::{ActivationRecord, ActivationStatus, activation_status};
use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{AppConfig, ConverterSettings};
use tabellwerk_document::{PdfDocument, PopplerRasterizer, PreviewRenderer};
use tabellwerk_extract::{ConversionDispatcher, ConversionOutcome, ConversionRequest, Converter, Extractor};
use tracing::{info, instrument};

use super::data_dir;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared application services. Cheap to clone; every field is behind an
/// `Arc`.
#[derive(Clone)]
pub struct AppServices {
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
    settings: Arc<Mutex<ConverterSettings>>,
    dispatcher: Arc<Mutex<ConversionDispatcher>>,
}

impl AppServices {
    /// Load config and settings from the data directory. Call once at
    /// startup.
    pub fn init() -> Self {
        Self::with_data_dir(data_dir::data_dir())
    }

    pub fn with_data_dir(dir: PathBuf) -> Self {
        info!(path = %dir.display(), "initialising app services");
        let config = AppConfig::load_or_default(&dir);
        let settings = ConverterSettings::load_or_default(&dir);
        let dispatcher = dispatcher_for(&config);

        Self {
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
            settings: Arc::new(Mutex::new(settings)),
            dispatcher: Arc::new(Mutex::new(dispatcher)),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // -- Config ---------------------------------------------------------------

    pub fn config(&self) -> AppConfig {
        lock(&self.config).clone()
    }

    /// Persist `config` and rewire the extraction backends to its tool paths.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        if self.is_converting() {
            return Err(TabellwerkError::ConversionBusy);
        }
        config.save(&self.data_dir)?;
        *lock(&self.config) = config.clone();
        *lock(&self.dispatcher) = dispatcher_for(config);
        info!("configuration saved");
        Ok(())
    }

    // -- Converter settings ---------------------------------------------------

    pub fn settings(&self) -> ConverterSettings {
        *lock(&self.settings)
    }

    pub fn save_settings(&self, settings: ConverterSettings) -> Result<()> {
        settings.save(&self.data_dir)?;
        *lock(&self.settings) = settings;
        Ok(())
    }

    // -- Activation -----------------------------------------------------------

    pub fn activation(&self, today: NaiveDate) -> ActivationStatus {
        activation_status(&self.data_dir, today)
    }

    /// Record a key entered by the user. Any non-blank key is accepted.
    pub fn activate(&self, key: &str, today: NaiveDate) -> Result<ActivationStatus> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TabellwerkError::EmptyActivationKey);
        }
        let record = ActivationRecord::new(key, today);
        record.save(&self.data_dir)?;
        Ok(record.status(today))
    }

    // -- Rendering ------------------------------------------------------------

    pub fn renderer(&self) -> PreviewRenderer<PopplerRasterizer> {
        let config = self.config();
        PreviewRenderer::new(PopplerRasterizer::new(config.tools.pdftoppm), config.preview_dpi)
    }

    // -- Conversion -----------------------------------------------------------

    pub fn is_converting(&self) -> bool {
        lock(&self.dispatcher).is_busy()
    }

    /// Run a conversion off the UI task.
    pub async fn convert(&self, request: ConversionRequest) -> Result<ConversionOutcome> {
        let dispatcher = lock(&self.dispatcher).clone();
        dispatcher.dispatch(request).await
    }

    // -- Document utilities ---------------------------------------------------

    #[instrument(skip(self, inputs), fields(inputs = inputs.len()))]
    pub fn merge_pdfs(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        PdfDocument::merge_files(inputs, output)
    }

    /// Split `pdf` into `page_<n>.pdf` files inside `dir`.
    pub fn split_pdf(&self, pdf: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
        PdfDocument::open(pdf)?.split_into_pages(dir)
    }

    /// OCR one page and write `<stem>_searchable.pdf` beside the source.
    #[cfg(feature = "ocr")]
    pub async fn searchable_pdf(&self, pdf: PathBuf, page: u32) -> Result<PathBuf> {
        use tabellwerk_document::PageRasterizer;
        use tabellwerk_document::ocr::{OcrConfig, OcrEngine};
        use tabellwerk_document::pdf::{TextPdfWriter, searchable_output_path};

        let config = self.config();
        tokio::task::spawn_blocking(move || {
            let rasterizer = PopplerRasterizer::new(&config.tools.pdftoppm);
            let bitmap = rasterizer.rasterize_file(&pdf, page, 300)?;
            let engine = OcrEngine::new(&OcrConfig::from_optional_dir(config.ocr_model_dir.as_deref()))?;
            let text = engine.recognize_text(&bitmap)?;
            let output = searchable_output_path(&pdf);
            let title = pdf
                .file_stem()
                .map(|s| format!("{} (searchable)", s.to_string_lossy()))
                .unwrap_or_else(|| "Searchable PDF".into());
            TextPdfWriter::new(config.paper_size)
                .with_title(title)
                .write(&text, &output)?;
            Ok(output)
        })
        .await
        .map_err(|e| TabellwerkError::OcrError(e.to_string()))?
    }

    #[cfg(not(feature = "ocr"))]
    pub async fn searchable_pdf(&self, _pdf: PathBuf, _page: u32) -> Result<PathBuf> {
        Err(TabellwerkError::FeatureUnavailable("ocr"))
    }
}

fn dispatcher_for(config: &AppConfig) -> ConversionDispatcher {
    ConversionDispatcher::new(Converter::new(Extractor::from_config(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn settings_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::with_data_dir(dir.path().to_path_buf());
        let mut settings = svc.settings();
        settings.stream = false;
        svc.save_settings(settings).unwrap();

        let reopened = AppServices::with_data_dir(dir.path().to_path_buf());
        assert!(!reopened.settings().stream);
    }

    #[test]
    fn activation_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::with_data_dir(dir.path().to_path_buf());
        assert_eq!(svc.activation(today()), ActivationStatus::Missing);
        assert!(svc.activate("   ", today()).is_err());
        svc.activate("ABCD-1234", today()).unwrap();
        assert!(matches!(svc.activation(today()), ActivationStatus::Active { .. }));
    }

    #[test]
    fn config_save_updates_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::with_data_dir(dir.path().to_path_buf());
        let mut config = svc.config();
        config.preview_dpi = 100;
        svc.save_config(&config).unwrap();
        assert_eq!(svc.renderer().dpi_for(1.5), 150);
    }
}
