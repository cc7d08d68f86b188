// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the image helpers behind the page preview.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use tabellwerk_document::fit_to_viewport;
use tabellwerk_document::image::{ocr_preprocess, table_line_overlay};

/// A 400x400 white page ruled into a 5x5 table.
fn ruled_page() -> DynamicImage {
    let mut img = RgbImage::from_pixel(400, 400, Rgb([255, 255, 255]));
    for y in 0..400 {
        for x in 0..400 {
            if x % 80 < 2 || y % 80 < 2 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }
    DynamicImage::ImageRgb8(img)
}

fn bench_overlays(c: &mut Criterion) {
    let page = ruled_page();

    c.bench_function("table_line_overlay (400x400)", |b| {
        b.iter(|| black_box(table_line_overlay(black_box(&page))));
    });

    c.bench_function("ocr_preprocess (400x400)", |b| {
        b.iter(|| black_box(ocr_preprocess(black_box(&page))));
    });
}

fn bench_fit(c: &mut Criterion) {
    let page = ruled_page();
    c.bench_function("fit_to_viewport 400 -> 250", |b| {
        b.iter(|| black_box(fit_to_viewport(black_box(page.clone()), 250, 250)));
    });
}

criterion_group!(benches, bench_overlays, bench_fit);
criterion_main!(benches);
