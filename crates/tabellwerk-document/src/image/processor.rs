// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: viewport fitting and PNG/JPEG encoding for rendered pages
// and placed images.

use std::path::Path;

use image::{DynamicImage, ImageFormat, imageops::FilterType};
use tabellwerk_core::error::{Result, TabellwerkError};
use tracing::{debug, instrument};

/// Chainable wrapper around a decoded image.
///
/// Each transformation consumes `self` and returns the result:
///
/// ```ignore
/// let png = ImageProcessor::open("logo.png")?
///     .fit_within(800, 600)
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TabellwerkError::NotFound(path.to_path_buf()));
        }
        let image = image::open(path).map_err(|err| {
            TabellwerkError::ImageError(format!("failed to open {}: {}", path.display(), err))
        })?;
        debug!(width = image.width(), height = image.height(), "Image loaded");
        Ok(Self { image })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Scale uniformly by `min(max_width / w, max_height / h)`, up or down, so
    /// the image fits the box with its aspect ratio intact.
    ///
    /// Boxes with a side of one pixel or less leave the image untouched; that
    /// is what a viewport reports before it has been laid out.
    #[instrument(skip(self), fields(from_w = self.image.width(), from_h = self.image.height()))]
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        if max_width <= 1 || max_height <= 1 || self.image.width() == 0 || self.image.height() == 0 {
            return self;
        }
        let scale = (max_width as f64 / self.image.width() as f64)
            .min(max_height as f64 / self.image.height() as f64);
        let new_w = ((self.image.width() as f64 * scale).round() as u32).max(1);
        let new_h = ((self.image.height() as f64 * scale).round() as u32).max(1);
        debug!(scale, new_w, new_h, "Fitting image");
        Self {
            image: self.image.resize_exact(new_w, new_h, FilterType::Lanczos3),
        }
    }

    // -- Output ---------------------------------------------------------------

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.image
            .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|err| TabellwerkError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode as JPEG at `quality` (1-100). Alpha is dropped.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        self.image
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|err| TabellwerkError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write to `path` as PNG or JPEG, chosen by extension.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let bytes = match ext.as_str() {
            "png" => self.to_png_bytes()?,
            "jpg" | "jpeg" => self.to_jpeg_bytes(90)?,
            other => {
                return Err(TabellwerkError::ImageError(format!(
                    "unsupported image extension {:?}; use .png or .jpg",
                    other
                )));
            }
        };
        std::fs::write(path, bytes)
            .map_err(|err| TabellwerkError::Write(format!("{}: {}", path.display(), err)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb([200, 10, 10])))
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let fitted = ImageProcessor::from_dynamic(solid(200, 100)).fit_within(100, 100);
        assert_eq!((fitted.width(), fitted.height()), (100, 50));
    }

    #[test]
    fn fit_within_scales_up() {
        let fitted = ImageProcessor::from_dynamic(solid(50, 100)).fit_within(400, 400);
        assert_eq!((fitted.width(), fitted.height()), (200, 400));
    }

    #[test]
    fn degenerate_viewport_is_a_no_op() {
        let fitted = ImageProcessor::from_dynamic(solid(30, 20)).fit_within(1, 500);
        assert_eq!((fitted.width(), fitted.height()), (30, 20));
    }

    #[test]
    fn save_chooses_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let proc = ImageProcessor::from_dynamic(solid(8, 8));

        let png = dir.path().join("page.png");
        proc.save(&png).unwrap();
        assert!(std::fs::read(&png).unwrap().starts_with(&[0x89, b'P', b'N', b'G']));

        let jpg = dir.path().join("page.JPG");
        proc.save(&jpg).unwrap();
        assert!(std::fs::read(&jpg).unwrap().starts_with(&[0xFF, 0xD8]));

        assert!(proc.save(dir.path().join("page.bmp")).is_err());
    }
}
