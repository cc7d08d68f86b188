// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tabula-java backend. Handles both ruled and whitespace-aligned tables.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{Backend, DetectOptions, Table};
use tracing::{info, instrument};

use super::{TableBackend, run_tool};
use crate::pages::to_page_arg;

/// Runs `java -jar <tabula.jar> --format JSON` and parses the output.
#[derive(Debug, Clone)]
pub struct TabulaBackend {
    java: PathBuf,
    jar: Option<PathBuf>,
}

impl TabulaBackend {
    pub fn new(java: impl Into<PathBuf>, jar: Option<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar,
        }
    }

    fn command(&self, jar: &Path, pdf: &Path, pages: &[u32], options: DetectOptions) -> Command {
        let mut command = Command::new(&self.java);
        command
            .arg("-jar")
            .arg(jar)
            .args(["--format", "JSON", "--guess", "--silent"])
            .args(["--pages", &to_page_arg(pages)]);
        if let Some(mode) = mode_flag(options) {
            command.arg(mode);
        }
        command.arg(pdf);
        command
    }
}

/// Force one detection mode when only one is switched on; otherwise tabula
/// picks per page.
fn mode_flag(options: DetectOptions) -> Option<&'static str> {
    match (options.detect_bordered, options.detect_borderless) {
        (true, false) => Some("--lattice"),
        (false, true) => Some("--stream"),
        _ => None,
    }
}

impl TableBackend for TabulaBackend {
    fn kind(&self) -> Backend {
        Backend::Tabula
    }

    #[instrument(skip(self, pages), fields(pdf = %pdf.display(), pages = pages.len()))]
    fn extract(&self, pdf: &Path, pages: &[u32], options: DetectOptions) -> Result<Vec<Table>> {
        let jar = self.jar.as_deref().ok_or_else(|| TabellwerkError::ToolUnavailable {
            tool: "tabula".into(),
            reason: "no tabula jar configured".into(),
        })?;
        if !jar.exists() {
            return Err(TabellwerkError::ToolUnavailable {
                tool: "tabula".into(),
                reason: format!("jar not found at {}", jar.display()),
            });
        }

        let output = run_tool("tabula", &mut self.command(jar, pdf, pages, options))?;
        let tables = parse_tabula_json(&String::from_utf8_lossy(&output.stdout))?;
        info!(tables = tables.len(), "tabula finished");
        Ok(tables)
    }
}

#[derive(Debug, Deserialize)]
struct TabulaTable {
    #[serde(default)]
    page_number: Option<u32>,
    #[serde(default)]
    data: Vec<Vec<TabulaCell>>,
}

#[derive(Debug, Deserialize)]
struct TabulaCell {
    #[serde(default)]
    text: String,
}

/// Parse tabula's JSON array of `{extraction_method, data: [[{text}]]}`.
/// Empty output means no tables.
pub fn parse_tabula_json(json: &str) -> Result<Vec<Table>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<TabulaTable> = serde_json::from_str(json)
        .map_err(|err| TabellwerkError::Extraction(format!("unexpected tabula output: {}", err)))?;
    Ok(raw
        .into_iter()
        .map(|table| {
            let rows = table
                .data
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.text).collect())
                .collect();
            Table::new(String::new(), table.page_number, rows)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"extraction_method": "lattice", "page_number": 2, "top": 10.0,
         "data": [[{"top": 1.0, "text": "Item"}, {"text": "Qty"}],
                  [{"text": "Bolt"}, {"text": "4"}]]},
        {"extraction_method": "stream",
         "data": [[{"text": "a"}]]}
    ]"#;

    #[test]
    fn parses_tables_and_pages() {
        let tables = parse_tabula_json(SAMPLE).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].page, Some(2));
        assert_eq!(tables[0].rows, [["Item", "Qty"], ["Bolt", "4"]]);
        assert_eq!(tables[1].page, None);
    }

    #[test]
    fn empty_output_means_no_tables() {
        assert!(parse_tabula_json("").unwrap().is_empty());
        assert!(parse_tabula_json("[]").unwrap().is_empty());
    }

    #[test]
    fn garbage_output_is_an_extraction_error() {
        assert!(matches!(
            parse_tabula_json("Exception in thread main"),
            Err(TabellwerkError::Extraction(_))
        ));
    }

    #[test]
    fn detection_switches_choose_mode() {
        let both = DetectOptions::default();
        assert_eq!(mode_flag(both), None);
        assert_eq!(
            mode_flag(DetectOptions { detect_bordered: true, detect_borderless: false }),
            Some("--lattice")
        );
        assert_eq!(
            mode_flag(DetectOptions { detect_bordered: false, detect_borderless: true }),
            Some("--stream")
        );
    }

    #[test]
    fn missing_jar_is_tool_unavailable() {
        let backend = TabulaBackend::new("java", None);
        let err = backend
            .extract(Path::new("x.pdf"), &[1], DetectOptions::default())
            .unwrap_err();
        assert!(matches!(err, TabellwerkError::ToolUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn drives_java_and_reads_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("tabula.jar");
        std::fs::write(&jar, b"").unwrap();
        // Echo the arguments into a file so the command line can be checked.
        let args_file = dir.path().join("args");
        let java = super::super::test_support::fake_tool(
            dir.path(),
            "java",
            &format!(
                "echo \"$@\" > {}\necho '[{{\"data\": [[{{\"text\": \"x\"}}]]}}]'",
                args_file.display()
            ),
        );

        let backend = TabulaBackend::new(java, Some(jar));
        let options = DetectOptions { detect_bordered: false, detect_borderless: true };
        let tables = backend.extract(Path::new("in.pdf"), &[1, 2, 3], options).unwrap();

        assert_eq!(tables[0].rows, [["x"]]);
        let args = std::fs::read_to_string(args_file).unwrap();
        assert!(args.contains("--pages 1-3"), "{args}");
        assert!(args.contains("--stream"), "{args}");
        assert!(args.trim_end().ends_with("in.pdf"), "{args}");
    }
}
