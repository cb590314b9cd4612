//! Image acquisition: read a local file or download a URL.

use std::path::Path;
use std::time::Duration;

use crate::config::ImageConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::ImageSource;

/// Fetches raw image bytes from disk or over HTTP(S).
pub struct ImageLoader {
    config: ImageConfig,
    client: reqwest::Client,
}

impl ImageLoader {
    pub fn new(config: ImageConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Load the raw bytes behind `source`.
    pub async fn load(&self, source: &ImageSource) -> AnalysisResult<Vec<u8>> {
        match source {
            ImageSource::Path(path) => self.read_file(path).await,
            ImageSource::Url(url) => self.fetch(url).await,
        }
    }

    async fn read_file(&self, path: &Path) -> AnalysisResult<Vec<u8>> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| AnalysisError::Decode {
                image: path.display().to_string(),
                message: format!("Cannot read file: {e}"),
            })?;

        if metadata.len() > self.max_bytes() {
            return Err(AnalysisError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.config.max_file_size_mb,
            });
        }

        tokio::fs::read(path).await.map_err(|e| AnalysisError::Decode {
            image: path.display().to_string(),
            message: format!("Cannot read file: {e}"),
        })
    }

    async fn fetch(&self, url: &str) -> AnalysisResult<Vec<u8>> {
        let fetch_error = |message: String| AnalysisError::Fetch {
            url: url.to_string(),
            message,
        };

        let mut resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .timeout(Duration::from_millis(self.config.fetch_timeout_ms))
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }

        let max_bytes = self.max_bytes();
        let too_large = || {
            fetch_error(format!(
                "Response exceeds the {}MB size limit",
                self.config.max_file_size_mb
            ))
        };
        if resp.content_length().is_some_and(|len| len > max_bytes) {
            return Err(too_large());
        }

        // Chunked responses carry no Content-Length
        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| fetch_error(format!("Failed to read body: {e}")))?
        {
            if (body.len() + chunk.len()) as u64 > max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        tracing::debug!("Fetched {} bytes from {url}", body.len());
        Ok(body)
    }

    fn max_bytes(&self) -> u64 {
        self.config.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}
