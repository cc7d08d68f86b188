// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export writer: extracted tables to XLSX (one sheet per table) or CSV (all
// tables concatenated under the first table's header).

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, XlsxError};
use tabellwerk_core::error::{Result, TabellwerkError};
use tabellwerk_core::{OutputFormat, Table};
use tracing::{info, instrument, warn};

/// Longest sheet name Excel accepts.
const MAX_SHEET_NAME: usize = 31;

/// `<dir>/<stem>_converted.<ext>` next to the source PDF.
pub fn default_output_path(pdf: &Path, format: OutputFormat) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tables".into());
    pdf.with_file_name(format!("{stem}_converted.{}", format.extension()))
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> TabellwerkError {
    TabellwerkError::Write(format!("{}: {}", path.display(), err))
}

/// Writes extraction results to disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportWriter;

impl ExportWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `tables` to `destination` in `format`. An empty table list is
    /// rejected with `NothingToExport` and nothing is written.
    #[instrument(skip(self, tables), fields(tables = tables.len(), ?format, path = %destination.display()))]
    pub fn write(&self, tables: &[Table], format: OutputFormat, destination: &Path) -> Result<()> {
        if tables.is_empty() {
            return Err(TabellwerkError::NothingToExport);
        }
        match format {
            OutputFormat::Spreadsheet => write_workbook(tables, destination),
            OutputFormat::DelimitedText => write_delimited(tables, destination),
        }?;
        info!("Tables exported");
        Ok(())
    }
}

/// Sheet names may not contain `[]:*?/\`, may not start or end with an
/// apostrophe, and are capped at 31 characters.
fn sheet_name(name: &str) -> String {
    let name = name.trim_matches(|c: char| c == '\'' || c.is_whitespace());
    let capped: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    capped.trim_end_matches('\'').to_string()
}

/// One valid sheet name per table. Blank names become `Table_<n>`, and
/// names Excel would treat as equal (it ignores case) get a `_<k>` suffix.
fn sheet_names(tables: &[Table]) -> Vec<String> {
    let mut taken: Vec<String> = Vec::with_capacity(tables.len());
    let mut names = Vec::with_capacity(tables.len());
    for (i, table) in tables.iter().enumerate() {
        let mut base = sheet_name(&table.name);
        if base.is_empty() || base.eq_ignore_ascii_case("history") {
            base = format!("Table_{}", i + 1);
        }
        let mut name = base.clone();
        let mut k = 2;
        while taken.contains(&name.to_lowercase()) {
            let suffix = format!("_{k}");
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            name = base.chars().take(keep).chain(suffix.chars()).collect();
            k += 1;
        }
        taken.push(name.to_lowercase());
        names.push(name);
    }
    names
}

fn write_workbook(tables: &[Table], destination: &Path) -> Result<()> {
    let build = || -> std::result::Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        for (table, name) in tables.iter().zip(sheet_names(tables)) {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name)?;
            for (r, row) in table.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    sheet.write_string(r as u32, c as u16, cell)?;
                }
            }
        }
        workbook.save(destination)
    };
    build().map_err(|err| write_error(destination, err))
}

/// Concatenate tables under the first table's header row. Every table must
/// have the first table's column count.
fn write_delimited(tables: &[Table], destination: &Path) -> Result<()> {
    let first = &tables[0];
    let width = first.width();
    let header = first.header().unwrap_or(&[]);

    for table in &tables[1..] {
        if table.width() != width {
            return Err(TabellwerkError::SchemaMismatch {
                table: table.name.clone(),
                expected: width,
                actual: table.width(),
            });
        }
        if table.header() != Some(header) {
            warn!(table = %table.name, "Header differs from the first table; using the first table's");
        }
    }

    let mut writer = csv::Writer::from_path(destination).map_err(|err| write_error(destination, err))?;
    let padded = |row: &[String]| -> Vec<String> {
        let mut row = row.to_vec();
        row.resize(width, String::new());
        row
    };

    writer
        .write_record(padded(header))
        .map_err(|err| write_error(destination, err))?;
    for table in tables {
        for row in table.body() {
            writer
                .write_record(padded(row))
                .map_err(|err| write_error(destination, err))?;
        }
    }
    writer.flush().map_err(|err| write_error(destination, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, rows: &[&[&str]]) -> Table {
        Table::new(
            name,
            Some(1),
            rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        )
    }

    #[test]
    fn default_path_replaces_extension() {
        assert_eq!(
            default_output_path(Path::new("/data/q3 report.pdf"), OutputFormat::Spreadsheet),
            PathBuf::from("/data/q3 report_converted.xlsx")
        );
        assert_eq!(
            default_output_path(Path::new("scan.PDF"), OutputFormat::DelimitedText),
            PathBuf::from("scan_converted.csv")
        );
    }

    #[test]
    fn empty_input_is_rejected_for_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        for format in [OutputFormat::Spreadsheet, OutputFormat::DelimitedText] {
            let path = dir.path().join(format!("out.{}", format.extension()));
            assert!(matches!(
                ExportWriter::new().write(&[], format, &path),
                Err(TabellwerkError::NothingToExport)
            ));
            assert!(!path.exists());
        }
    }

    #[test]
    fn csv_concatenates_under_first_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let tables = [
            table("Table_1", &[&["Item", "Qty"], &["Bolt", "4"]]),
            table("Table_2", &[&["Item", "Qty"], &["Nut", "9"], &["Washer"]]),
        ];
        ExportWriter::new().write(&tables, OutputFormat::DelimitedText, &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Item,Qty\nBolt,4\nNut,9\nWasher,\n"
        );
    }

    #[test]
    fn csv_rejects_mismatched_widths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let tables = [
            table("Table_1", &[&["a", "b"]]),
            table("Table_2", &[&["a", "b", "c"]]),
        ];
        let err = ExportWriter::new()
            .write(&tables, OutputFormat::DelimitedText, &path)
            .unwrap_err();
        assert!(matches!(
            err,
            TabellwerkError::SchemaMismatch { expected: 2, actual: 3, .. }
        ));
    }

    #[test]
    fn xlsx_is_written_as_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let tables = [
            table("Table_1", &[&["a", "b"]]),
            table("Table_2", &[&["c"]]),
        ];
        ExportWriter::new().write(&tables, OutputFormat::Spreadsheet, &path).unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn sheet_names_are_sanitised() {
        assert_eq!(sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sheet_name("'quoted'"), "quoted");
    }

    #[test]
    fn sheet_names_are_unique_and_never_blank() {
        let long = "y".repeat(40);
        let tables = [
            table("Totals", &[&["a"]]),
            table("totals", &[&["b"]]),
            table("", &[&["c"]]),
            table(&long, &[&["d"]]),
            table(&long, &[&["e"]]),
        ];
        let names = sheet_names(&tables);
        assert_eq!(names[0], "Totals");
        assert_eq!(names[1], "totals_2");
        assert_eq!(names[2], "Table_3");
        assert_eq!(names[3], "y".repeat(31));
        assert_eq!(names[4], format!("{}_2", "y".repeat(29)));
    }

    #[test]
    fn xlsx_accepts_duplicate_and_blank_table_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dupes.xlsx");
        let tables = [
            table("Sheet", &[&["a"]]),
            table("Sheet", &[&["b"]]),
            table("", &[&["c"]]),
        ];
        ExportWriter::new().write(&tables, OutputFormat::Spreadsheet, &path).unwrap();
        assert!(path.exists());
    }
}
