// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table extraction backends. Detection itself is done by external tools; each
// backend only knows how to drive one of them and read back its tables.

pub mod camelot;
#[cfg(feature = "ocr")]
pub mod ocr;
pub mod tabula;

use std::path::Path;
use std::process::{Command, Output};

use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{Backend, DetectOptions, Table};
use tracing::debug;

pub use camelot::CamelotBackend;
#[cfg(feature = "ocr")]
pub use ocr::OcrBackend;
pub use tabula::TabulaBackend;

/// One way of finding tables in a PDF.
///
/// Returned tables are raw: names are ignored and cells untrimmed. The
/// orchestrator normalises and names them.
pub trait TableBackend: Send + Sync {
    fn kind(&self) -> Backend;

    /// Extract tables from the given 1-based pages, in page order.
    fn extract(&self, pdf: &Path, pages: &[u32], options: DetectOptions) -> Result<Vec<Table>>;
}

/// Run an external tool to completion, mapping launch failures to
/// `ToolUnavailable` and non-zero exits to `Extraction`.
pub(crate) fn run_tool(tool: &str, command: &mut Command) -> Result<Output> {
    debug!(tool, ?command, "Running extraction tool");
    let output = command.output().map_err(|err| TabellwerkError::ToolUnavailable {
        tool: tool.to_string(),
        reason: err.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().last().unwrap_or("no error output").trim();
        return Err(TabellwerkError::Extraction(format!(
            "{tool} exited with {}: {detail}",
            output.status
        )));
    }
    Ok(output)
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable shell script standing in for an external tool.
    pub(crate) fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
