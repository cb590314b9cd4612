//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.image.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "image.max_dimension must be > 0".into(),
            ));
        }
        if self.image.fetch_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "image.fetch_timeout_ms must be > 0".into(),
            ));
        }
        if self.image.jpeg_quality == 0 || self.image.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "image.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.image.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "image.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.model must not be empty".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.model.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "model.max_output_tokens must be > 0".into(),
            ));
        }
        if self.model.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "model.timeout_ms must be > 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".into(),
            ));
        }
        if self.prompts.default_language.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prompts.default_language must not be empty".into(),
            ));
        }
        Ok(())
    }
}
