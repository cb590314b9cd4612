//! Error types for GeoLens.
//!
//! Analysis failures are a tagged enum so callers can branch on the kind of
//! failure (fetch, decode, rate limit, safety block, ...) instead of matching
//! on message text.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Message returned when the first candidate was blocked by a safety filter.
pub const SAFETY_BLOCKED_MESSAGE: &str = "Response was blocked by safety filters.";

/// Message returned when the model produced no extractable text.
pub const NO_CONTENT_MESSAGE: &str = "No content generated";

/// Top-level error type for GeoLens operations.
#[derive(Error, Debug)]
pub enum GeoLensError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image analysis errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Prompt template file is unreadable, malformed or incomplete
    #[error("Failed to load prompt templates from {path}: {message}")]
    TemplateError { path: PathBuf, message: String },
}

/// A failed call to the vision model.
///
/// Carries the HTTP status when the failure came from an HTTP response, and
/// the retry delay the server suggested, if any.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ModelError {
    /// Human-readable failure description
    pub message: String,
    /// HTTP status code, when available
    pub status_code: Option<u16>,
    /// Server-suggested wait before retrying
    pub retry_after: Option<Duration>,
}

impl ModelError {
    /// A failure with no HTTP status (connection errors, parse errors, ...).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            retry_after: None,
        }
    }

    /// A failure reported by an HTTP response.
    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status_code),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, delay: Option<Duration>) -> Self {
        self.retry_after = delay;
        self
    }
}

/// Why an analysis did not produce text.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Downloading a URL image failed
    #[error("Failed to fetch image from {url}: {message}")]
    Fetch { url: String, message: String },

    /// Local image unreadable, or image bytes corrupt or undecodable
    #[error("Decode error for {image}: {message}")]
    Decode { image: String, message: String },

    /// Image file exceeds the configured size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Every attempt was rate limited
    #[error("Rate limited after {attempts} attempts: {source}")]
    RateLimited {
        attempts: u32,
        #[source]
        source: ModelError,
    },

    /// The model call failed for a reason other than rate limiting
    #[error("Error in analysis: {0}")]
    Model(#[source] ModelError),

    /// A single model call exceeded its deadline
    #[error("Model call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The first candidate was blocked by a safety filter
    #[error("Response was blocked by safety filters.")]
    SafetyBlocked,

    /// The model returned no text at all
    #[error("No content generated")]
    EmptyResponse,
}

impl AnalysisError {
    /// Short machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Fetch { .. } => "fetch",
            AnalysisError::Decode { .. } => "decode",
            AnalysisError::FileTooLarge { .. } => "file_too_large",
            AnalysisError::RateLimited { .. } => "rate_limited",
            AnalysisError::Model(_) => "model",
            AnalysisError::Timeout { .. } => "timeout",
            AnalysisError::SafetyBlocked => "safety_blocked",
            AnalysisError::EmptyResponse => "empty_response",
        }
    }
}

/// Convenience type alias for GeoLens results.
pub type Result<T> = std::result::Result<T, GeoLensError>;

/// Convenience type alias for analysis results.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
