// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis overlays shown in place of the plain page preview: detected ruling
// lines, and the binarised image that OCR will see.

use image::{DynamicImage, GrayImage, Luma, Rgb};
use imageproc::contrast::otsu_level;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, detect_lines, draw_polar_lines};
use tracing::{debug, instrument};

const LINE_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);

/// Canny hysteresis thresholds.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Minimum edge pixels on a line before it counts as a ruling.
const VOTE_THRESHOLD: u32 = 100;

/// Blur sigma used to knock out speckle before binarising.
const DENOISE_SIGMA: f32 = 1.0;

/// Draw every straight ruling line found on the page in green.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn table_line_overlay(image: &DynamicImage) -> DynamicImage {
    let gray = image.to_luma8();
    let edges = canny(&gray, CANNY_LOW, CANNY_HIGH);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: VOTE_THRESHOLD,
            suppression_radius: 8,
        },
    );
    debug!(lines = lines.len(), "Ruling lines detected");

    let canvas = image.to_rgb8();
    DynamicImage::ImageRgb8(draw_polar_lines(&canvas, &lines, LINE_COLOUR))
}

/// Grayscale, denoise, and binarise with Otsu's threshold.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn ocr_preprocess(image: &DynamicImage) -> DynamicImage {
    let gray = gaussian_blur_f32(&image.to_luma8(), DENOISE_SIGMA);
    let level = otsu_level(&gray);
    debug!(level, "Otsu level");

    let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    DynamicImage::ImageLuma8(binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// White page with a black ruled grid.
    fn grid(size: u32) -> DynamicImage {
        let mut img = RgbImage::from_pixel(size, size, Rgb([255, 255, 255]));
        for y in 0..size {
            for x in 0..size {
                if x % 50 < 3 || y % 50 < 3 {
                    img.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn overlay_marks_ruling_lines() {
        let overlay = table_line_overlay(&grid(200)).to_rgb8();
        assert!(overlay.pixels().any(|p| *p == LINE_COLOUR));
        assert_eq!(overlay.dimensions(), (200, 200));
    }

    #[test]
    fn blank_page_gets_no_lines() {
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 120, Rgb([255, 255, 255])));
        let overlay = table_line_overlay(&blank).to_rgb8();
        assert!(overlay.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn preprocess_yields_pure_black_and_white() {
        let processed = ocr_preprocess(&grid(100)).to_luma8();
        assert!(processed.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert!(processed.pixels().any(|p| p.0[0] == 0));
        assert!(processed.pixels().any(|p| p.0[0] == 255));
    }
}
