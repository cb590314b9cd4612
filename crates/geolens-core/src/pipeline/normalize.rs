//! Color normalization, downscaling and JPEG re-encoding for upload.
//!
//! The transform is lossy and one-way: the original resolution and color
//! mode are not recoverable from the output.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::config::ImageConfig;

/// Prepares decoded images for the model.
pub struct Normalizer {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl Normalizer {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Convert to 3-channel RGB and shrink so neither edge exceeds the bound.
    ///
    /// Images already within the bound keep their size; nothing is upscaled.
    pub fn normalize(&self, image: DynamicImage) -> DynamicImage {
        let image = match image {
            DynamicImage::ImageRgb8(_) => image,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };

        let (width, height) = image.dimensions();
        if width <= self.max_dimension && height <= self.max_dimension {
            return image;
        }

        let resized = image.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3);
        tracing::debug!(
            "Downscaled image from {width}x{height} to {}x{}",
            resized.width(),
            resized.height()
        );
        resized
    }

    /// Encode a normalized image as JPEG.
    pub fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
        image.write_with_encoder(encoder)?;
        Ok(buffer)
    }
}
