//! Image decoding with content-based format detection.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::error::{AnalysisError, AnalysisResult};

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Decodes raw bytes off the async runtime.
pub struct ImageDecoder;

impl ImageDecoder {
    /// Decode `bytes`, labelling errors with `label` (a path or URL).
    pub async fn decode(bytes: Vec<u8>, label: &str) -> AnalysisResult<DecodedImage> {
        let label_owned = label.to_string();
        tokio::task::spawn_blocking(move || Self::decode_sync(bytes, &label_owned))
            .await
            .map_err(|e| AnalysisError::Decode {
                image: label.to_string(),
                message: format!("Task join error: {e}"),
            })?
    }

    /// Synchronous decode (runs in spawn_blocking).
    pub fn decode_sync(bytes: Vec<u8>, label: &str) -> AnalysisResult<DecodedImage> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| AnalysisError::Decode {
                image: label.to_string(),
                message: format!("Cannot detect image format: {e}"),
            })?;
        let format = reader.format().ok_or_else(|| AnalysisError::Decode {
            image: label.to_string(),
            message: "Unrecognized image format".to_string(),
        })?;
        let image = reader.decode().map_err(|e| AnalysisError::Decode {
            image: label.to_string(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_format_detected_by_content() {
        let bytes = png_bytes(&DynamicImage::new_rgb8(40, 20));
        // Label claims JPEG, content is PNG
        let decoded = ImageDecoder::decode_sync(bytes, "misnamed.jpg").unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (40, 20));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = ImageDecoder::decode_sync(b"definitely not an image".to_vec(), "junk.jpg")
            .err()
            .unwrap();
        assert_eq!(err.kind(), "decode");
        assert!(err.to_string().contains("junk.jpg"));
    }

    #[tokio::test]
    async fn test_truncated_png_fails_to_decode() {
        let mut bytes = png_bytes(&DynamicImage::new_rgb8(64, 64));
        bytes.truncate(bytes.len() / 2);
        let result = ImageDecoder::decode(bytes, "cut.png").await;
        assert!(matches!(result, Err(AnalysisError::Decode { .. })));
    }
}
