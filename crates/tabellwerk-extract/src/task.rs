// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion = extract + export, run off the UI task with at most one in
// flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{DetectOptions, Engine, OutputFormat, PageSelection};
use tracing::{error, info, instrument};

use crate::export::{ExportWriter, default_output_path};
use crate::orchestrator::Extractor;

/// Everything a conversion needs, captured when it is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub pdf: PathBuf,
    pub selection: PageSelection,
    pub engine: Engine,
    pub options: DetectOptions,
    pub format: OutputFormat,
    /// `None` writes to `<stem>_converted.<ext>` next to the PDF.
    pub destination: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn destination(&self) -> PathBuf {
        self.destination
            .clone()
            .unwrap_or_else(|| default_output_path(&self.pdf, self.format))
    }
}

/// How a conversion that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Saved { path: PathBuf, tables: usize },
    /// The selected pages had no tables; nothing was written.
    NoTables,
}

/// Runs a conversion synchronously.
#[derive(Clone)]
pub struct Converter {
    extractor: Extractor,
    writer: ExportWriter,
}

impl Converter {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor,
            writer: ExportWriter::new(),
        }
    }

    #[instrument(skip_all, fields(pdf = %request.pdf.display(), engine = request.engine.label()))]
    pub fn run(&self, request: &ConversionRequest) -> Result<ConversionOutcome> {
        let result = self.extractor.extract(
            &request.pdf,
            &request.selection,
            request.engine,
            request.options,
        )?;
        if result.is_empty() {
            info!("No tables found");
            return Ok(ConversionOutcome::NoTables);
        }

        let path = request.destination();
        self.writer.write(&result.tables, request.format, &path)?;
        info!(path = %path.display(), tables = result.len(), "Conversion saved");
        Ok(ConversionOutcome::Saved {
            path,
            tables: result.len(),
        })
    }
}

/// Clears the busy flag however the blocking task ends, panics included.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs conversions on the blocking pool, one at a time.
///
/// A request made while another is running fails with `ConversionBusy`
/// rather than queueing. There is no cancellation or timeout.
#[derive(Clone)]
pub struct ConversionDispatcher {
    converter: Arc<Converter>,
    busy: Arc<AtomicBool>,
}

impl ConversionDispatcher {
    pub fn new(converter: Converter) -> Self {
        Self {
            converter: Arc::new(converter),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run `request` on the blocking pool. A panic inside the conversion is
    /// reported as an extraction failure.
    pub async fn dispatch(&self, request: ConversionRequest) -> Result<ConversionOutcome> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TabellwerkError::ConversionBusy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));
        let converter = Arc::clone(&self.converter);

        let joined = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            converter.run(&request)
        })
        .await;

        match joined {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(error = %join_err, "Conversion task did not finish");
                Err(TabellwerkError::Extraction(if join_err.is_panic() {
                    "conversion crashed unexpectedly".into()
                } else {
                    join_err.to_string()
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use tabellwerk_core::{Backend, Table};

    use super::*;
    use crate::backend::TableBackend;
    use crate::orchestrator::tests::{FakeBackend, raw, sample_pdf};

    struct SlowBackend;

    impl TableBackend for SlowBackend {
        fn kind(&self) -> Backend {
            Backend::Tabula
        }

        fn extract(&self, _pdf: &Path, _pages: &[u32], _options: DetectOptions) -> Result<Vec<Table>> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(vec![raw(&[&["h"], &["v"]])])
        }
    }

    struct PanickingBackend;

    impl TableBackend for PanickingBackend {
        fn kind(&self) -> Backend {
            Backend::Tabula
        }

        fn extract(&self, _pdf: &Path, _pages: &[u32], _options: DetectOptions) -> Result<Vec<Table>> {
            panic!("backend blew up");
        }
    }

    fn request(pdf: PathBuf, format: OutputFormat) -> ConversionRequest {
        ConversionRequest {
            pdf,
            selection: PageSelection::All,
            engine: Engine::Auto,
            options: DetectOptions::default(),
            format,
            destination: None,
        }
    }

    fn dispatcher(backend: Arc<dyn TableBackend>) -> ConversionDispatcher {
        ConversionDispatcher::new(Converter::new(Extractor::default().with_backend(backend)))
    }

    #[test]
    fn converter_saves_next_to_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 1);
        let converter = Converter::new(
            Extractor::default().with_backend(Arc::new(FakeBackend::new(
                Backend::Tabula,
                vec![raw(&[&["a", "b"], &["1", "2"]])],
            ))),
        );

        let outcome = converter.run(&request(pdf, OutputFormat::DelimitedText)).unwrap();
        let expected = dir.path().join("sample_converted.csv");
        assert_eq!(outcome, ConversionOutcome::Saved { path: expected.clone(), tables: 1 });
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn converter_reports_no_tables_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 1);
        let converter = Converter::new(
            Extractor::default().with_backend(Arc::new(FakeBackend::new(Backend::Tabula, vec![]))),
        );
        let req = request(pdf, OutputFormat::Spreadsheet);
        assert_eq!(converter.run(&req).unwrap(), ConversionOutcome::NoTables);
        assert!(!req.destination().exists());
    }

    #[tokio::test]
    async fn second_request_while_busy_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 1);
        let dispatcher = dispatcher(Arc::new(SlowBackend));

        let first = {
            let dispatcher = dispatcher.clone();
            let req = request(pdf.clone(), OutputFormat::Spreadsheet);
            tokio::spawn(async move { dispatcher.dispatch(req).await })
        };
        while !dispatcher.is_busy() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let second = dispatcher.dispatch(request(pdf, OutputFormat::Spreadsheet)).await;
        assert!(matches!(second, Err(TabellwerkError::ConversionBusy)));

        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, ConversionOutcome::Saved { tables: 1, .. }));
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn panic_becomes_failure_and_clears_busy() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = sample_pdf(dir.path(), 1);
        let dispatcher = dispatcher(Arc::new(PanickingBackend));

        let result = dispatcher.dispatch(request(pdf, OutputFormat::Spreadsheet)).await;
        assert!(matches!(result, Err(TabellwerkError::Extraction(_))));
        assert!(!dispatcher.is_busy());
    }
}
