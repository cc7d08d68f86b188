// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for table normalisation and export.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tabellwerk_core::{OutputFormat, Table};
use tabellwerk_extract::ExportWriter;
use tabellwerk_extract::orchestrator::normalize;

/// `count` raw tables of 200 rows x 8 padded cells.
fn raw_tables(count: usize) -> Vec<Table> {
    (0..count)
        .map(|t| {
            let rows = (0..200)
                .map(|r| (0..8).map(|c| format!("  t{t}r{r}c{c}  ")).collect())
                .collect();
            Table::new("", Some(1), rows)
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let tables = raw_tables(10);
    c.bench_function("normalize 10x200x8", |b| {
        b.iter(|| black_box(normalize(black_box(tables.clone()))));
    });
}

fn bench_export(c: &mut Criterion) {
    let tables = normalize(raw_tables(10));
    let dir = tempfile::tempdir().expect("temp dir");
    let writer = ExportWriter::new();

    c.bench_function("export csv 10x200x8", |b| {
        let path = dir.path().join("bench.csv");
        b.iter(|| writer.write(black_box(&tables), OutputFormat::DelimitedText, &path));
    });

    c.bench_function("export xlsx 10x200x8", |b| {
        let path = dir.path().join("bench.xlsx");
        b.iter(|| writer.write(black_box(&tables), OutputFormat::Spreadsheet, &path));
    });
}

criterion_group!(benches, bench_normalize, bench_export);
criterion_main!(benches);
