//! Image preparation: load → decode → normalize → encode.

use crate::config::ImageConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::llm::ImageInput;
use crate::types::ImageSource;

use super::decode::ImageDecoder;
use super::normalize::Normalizer;
use super::source::ImageLoader;

/// An image ready for upload, plus the dimensions before and after.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Encoded payload for the model
    pub input: ImageInput,
    /// Decoded size before normalization
    pub original_size: (u32, u32),
    /// Size after normalization
    pub size: (u32, u32),
}

/// Turns an [`ImageSource`] into an upload-ready JPEG.
pub struct ImagePreparer {
    loader: ImageLoader,
    normalizer: Normalizer,
}

impl ImagePreparer {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            loader: ImageLoader::new(config.clone()),
            normalizer: Normalizer::new(config),
        }
    }

    /// Acquire, decode and normalize the image behind `source`.
    pub async fn prepare(&self, source: &ImageSource) -> AnalysisResult<PreparedImage> {
        let label = source.to_string();
        let bytes = self.loader.load(source).await?;
        let decoded = ImageDecoder::decode(bytes, &label).await?;
        tracing::debug!(
            "Decoded {label}: {}x{} {:?}",
            decoded.width,
            decoded.height,
            decoded.format
        );

        let normalized = self.normalizer.normalize(decoded.image);
        let size = (normalized.width(), normalized.height());
        let jpeg = self
            .normalizer
            .encode_jpeg(&normalized)
            .map_err(|e| AnalysisError::Decode {
                image: label.clone(),
                message: format!("Failed to encode normalized image: {e}"),
            })?;

        Ok(PreparedImage {
            input: ImageInput::from_bytes(&jpeg, "jpeg"),
            original_size: (decoded.width, decoded.height),
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, LumaA};
    use std::io::Cursor;

    #[tokio::test]
    async fn test_prepare_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        let gray: ImageBuffer<LumaA<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(2000, 1000, LumaA([90, 255]));
        DynamicImage::ImageLumaA8(gray)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let preparer = ImagePreparer::new(&ImageConfig::default());
        let prepared = preparer.prepare(&ImageSource::Path(path)).await.unwrap();

        assert_eq!(prepared.original_size, (2000, 1000));
        assert_eq!(prepared.size, (800, 400));
        assert_eq!(prepared.input.media_type, "image/jpeg");
        assert!(!prepared.input.data.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_url() {
        let mut png = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(120, 80)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/landmark.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(png.into_inner())
            .create_async()
            .await;

        let preparer = ImagePreparer::new(&ImageConfig::default());
        let source = ImageSource::parse(&format!("{}/landmark.png", server.url()));
        let prepared = preparer.prepare(&source).await.unwrap();

        assert_eq!(prepared.size, (120, 80));
    }

    #[tokio::test]
    async fn test_prepare_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.jpg");
        std::fs::write(&path, b"\xFF\xD8\xFF\xE0 not really a jpeg").unwrap();

        let preparer = ImagePreparer::new(&ImageConfig::default());
        let err = preparer.prepare(&ImageSource::Path(path)).await.unwrap_err();
        assert_eq!(err.kind(), "decode");
    }
}
