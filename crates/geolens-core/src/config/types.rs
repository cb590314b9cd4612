//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image loading and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Longest allowed edge after normalization, in pixels
    pub max_dimension: u32,

    /// Timeout for fetching URL images, in milliseconds
    pub fetch_timeout_ms: u64,

    /// User-Agent header sent when fetching URL images
    pub user_agent: String,

    /// JPEG quality used to encode the normalized image for upload
    pub jpeg_quality: u8,

    /// Maximum source file size in megabytes
    pub max_file_size_mb: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            fetch_timeout_ms: 10_000,
            user_agent: "Mozilla/5.0".to_string(),
            jpeg_quality: 85,
            max_file_size_mb: 50,
        }
    }
}

/// Vision model (Gemini) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// API base URL
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Sampling temperature. 0 gives greedy decoding.
    pub temperature: f32,

    /// Upper bound on generated tokens
    pub max_output_tokens: u32,

    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: "${GOOGLE_API_KEY}".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.0,
            max_output_tokens: 1000,
            timeout_ms: 60_000,
        }
    }
}

impl ModelConfig {
    /// The API key with a whole-value `${VAR}` reference read from the
    /// environment. `None` when the result is empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        let key = self.api_key.trim();
        let resolved = match key.strip_prefix("${").and_then(|k| k.strip_suffix('}')) {
            Some(var) => std::env::var(var).ok()?,
            None => key.to_string(),
        };
        (!resolved.is_empty()).then_some(resolved)
    }
}

/// Retry policy for rate-limited model calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Backoff unit in milliseconds; attempt `n` waits `base * 2^n`
    pub base_delay_ms: u64,

    /// Cap applied to both computed and server-suggested delays
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
        }
    }
}

/// Prompt template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Optional JSON template file overriding the built-in templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Language used when none is requested or the requested one is unknown
    pub default_language: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_language: "english".to_string(),
        }
    }
}

impl PromptsConfig {
    /// Template file path with `~` expanded, if configured.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|path| {
            let path_str = path.to_string_lossy();
            PathBuf::from(shellexpand::tilde(&path_str).into_owned())
        })
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
