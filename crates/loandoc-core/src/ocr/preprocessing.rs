//! Image preparation before OCR.

use std::borrow::Cow;

use image::DynamicImage;
use tracing::debug;

/// Downscales oversized page renders before they reach the OCR engine.
pub struct ImagePreprocessor {
    /// Maximum image dimension.
    max_size: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self { max_size: 2048 }
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Fit the image within the maximum size, preserving aspect ratio.
    pub fn prepare<'a>(&self, image: &'a DynamicImage) -> Cow<'a, DynamicImage> {
        let (width, height) = (image.width(), image.height());
        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);

        if (new_width, new_height) == (width, height) {
            return Cow::Borrowed(image);
        }

        debug!(
            "Downscaling page image {}x{} -> {}x{}",
            width, height, new_width, new_height
        );
        Cow::Owned(image.resize_exact(
            new_width,
            new_height,
            image::imageops::FilterType::Lanczos3,
        ))
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if max_dim <= self.max_size {
            return (width, height);
        }

        let scale = self.max_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        (new_width.max(1), new_height.max(1))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_resize_dimensions() {
        let preprocessor = ImagePreprocessor::new().with_max_size(960);

        // Image smaller than target
        let (w, h) = preprocessor.calculate_resize_dimensions(500, 300);
        assert_eq!((w, h), (500, 300));

        // Image larger than target
        let (w, h) = preprocessor.calculate_resize_dimensions(1920, 1080);
        assert_eq!(w, 960);
        assert!(h < 960);
    }

    #[test]
    fn test_prepare_borrows_small_images() {
        let preprocessor = ImagePreprocessor::new().with_max_size(100);
        let small = DynamicImage::ImageLuma8(GrayImage::new(80, 40));
        assert!(matches!(preprocessor.prepare(&small), Cow::Borrowed(_)));

        let large = DynamicImage::ImageLuma8(GrayImage::new(400, 200));
        let prepared = preprocessor.prepare(&large);
        assert_eq!((prepared.width(), prepared.height()), (100, 50));
    }
}
