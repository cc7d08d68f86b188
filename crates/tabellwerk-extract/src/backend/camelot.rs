// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camelot backend. Uses Camelot's ruling-line ("lattice") detector, which is
// Camelot's own default; the detection switches do not apply to it.

use std::path::{Path, PathBuf};
use std::process::Command;

use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{Backend, DetectOptions, Table};
use tracing::{debug, info, instrument};

use super::{TableBackend, run_tool};
use crate::pages::to_page_arg;

const OUTPUT_STEM: &str = "tables";

/// Runs the `camelot` command line and reads back its per-table CSV files.
#[derive(Debug, Clone)]
pub struct CamelotBackend {
    program: PathBuf,
}

impl CamelotBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl TableBackend for CamelotBackend {
    fn kind(&self) -> Backend {
        Backend::Camelot
    }

    #[instrument(skip(self, pages, _options), fields(pdf = %pdf.display(), pages = pages.len()))]
    fn extract(&self, pdf: &Path, pages: &[u32], _options: DetectOptions) -> Result<Vec<Table>> {
        let workdir = tempfile::tempdir()?;
        let target = workdir.path().join(format!("{OUTPUT_STEM}.csv"));

        let mut command = Command::new(&self.program);
        command
            .args(["--pages", &to_page_arg(pages)])
            .args(["--format", "csv"])
            .arg("--output")
            .arg(&target)
            .arg("lattice")
            .arg(pdf);
        run_tool("camelot", &mut command)?;

        let tables = read_camelot_outputs(workdir.path())?;
        info!(tables = tables.len(), "camelot finished");
        Ok(tables)
    }
}

/// `(page, order)` from a name like `tables-page-3-table-2.csv`.
fn output_key(file_name: &str) -> Option<(u32, u32)> {
    let rest = file_name
        .strip_prefix(OUTPUT_STEM)?
        .strip_prefix("-page-")?
        .strip_suffix(".csv")?;
    let (page, order) = rest.split_once("-table-")?;
    Some((page.parse().ok()?, order.parse().ok()?))
}

/// Read every table Camelot wrote into `dir`, ordered by page then table.
pub fn read_camelot_outputs(dir: &Path) -> Result<Vec<Table>> {
    let mut found: Vec<((u32, u32), PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            output_key(&name.to_string_lossy()).map(|key| (key, entry.path()))
        })
        .collect();
    found.sort_by_key(|(key, _)| *key);
    debug!(files = found.len(), "camelot outputs found");

    found
        .into_iter()
        .map(|((page, _), path)| {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&path)
                .map_err(|err| TabellwerkError::Extraction(format!("{}: {}", path.display(), err)))?;
            let rows = reader
                .records()
                .map(|record| {
                    record
                        .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                        .map_err(|err| TabellwerkError::Extraction(format!("{}: {}", path.display(), err)))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Table::new(String::new(), Some(page), rows))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_parse() {
        assert_eq!(output_key("tables-page-3-table-2.csv"), Some((3, 2)));
        assert_eq!(output_key("tables-page-x-table-2.csv"), None);
        assert_eq!(output_key("notes.txt"), None);
    }

    #[test]
    fn outputs_are_read_in_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tables-page-10-table-1.csv"), "c\n").unwrap();
        std::fs::write(dir.path().join("tables-page-2-table-2.csv"), "b1,b2\n,\n").unwrap();
        std::fs::write(dir.path().join("tables-page-2-table-1.csv"), "a\n").unwrap();
        std::fs::write(dir.path().join("unrelated.csv"), "zzz\n").unwrap();

        let tables = read_camelot_outputs(dir.path()).unwrap();
        let firsts: Vec<&str> = tables.iter().map(|t| t.rows[0][0].as_str()).collect();
        assert_eq!(firsts, ["a", "b1", "c"]);
        assert_eq!(tables[2].page, Some(10));
        assert_eq!(tables[1].rows.len(), 2);
    }

    #[test]
    fn no_outputs_means_no_tables() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_camelot_outputs(dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn drives_camelot_cli() {
        let dir = tempfile::tempdir().unwrap();
        // Write a table next to the requested output path, as camelot does.
        let camelot = super::super::test_support::fake_tool(
            dir.path(),
            "camelot",
            r#"while [ "$1" != "--output" ]; do shift; done
out_dir=$(dirname "$2")
printf 'h1,h2\n1,2\n' > "$out_dir/tables-page-1-table-1.csv""#,
        );
        let tables = CamelotBackend::new(camelot)
            .extract(Path::new("in.pdf"), &[1], DetectOptions::default())
            .unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows, [["h1", "h2"], ["1", "2"]]);
    }
}
