//! Vision model trait and request/response types.
//!
//! Defines the interface the model client implements, so the analyzer's
//! retry and extraction logic can be driven by a scripted model in tests.

use crate::config::ModelConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

/// Base64-encoded image ready to send to a model API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }
}

/// A request to identify an image.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The image to identify
    pub image: ImageInput,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// Build an identification request using the configured sampling settings.
    pub fn identify(image: ImageInput, prompt: String, config: &ModelConfig) -> Self {
        Self {
            image,
            prompt,
            max_tokens: config.max_output_tokens,
            temperature: config.temperature,
        }
    }
}

/// One safety classification attached to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
    /// Whether this rating caused the content to be withheld
    pub blocked: bool,
}

/// One alternative output returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Text of each content part, in order; `None` for non-text parts
    pub parts: Vec<Option<String>>,
    /// Safety metadata for this candidate
    pub safety_ratings: Vec<SafetyRating>,
    /// Why generation stopped (e.g., "STOP", "MAX_TOKENS", "SAFETY")
    pub finish_reason: Option<String>,
}

impl Candidate {
    /// Whether a safety filter withheld this candidate.
    pub fn is_blocked(&self) -> bool {
        self.safety_ratings.iter().any(|r| r.blocked)
            || self.finish_reason.as_deref() == Some("SAFETY")
    }
}

/// What the model returned for a successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReply {
    /// Direct text accessor, when the response has plain text
    pub text: Option<String>,
    /// Structured candidates
    pub candidates: Vec<Candidate>,
    /// Reason the prompt itself was blocked, if it was
    pub block_reason: Option<String>,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
}

/// Trait the vision model client implements.
///
/// Object-safe via `async_trait`; the analyzer holds a `Box<dyn VisionModel>`.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier sent to the API.
    fn model(&self) -> &str;

    /// Run one generation call. Implementations do not retry.
    async fn generate(&self, request: &LlmRequest) -> Result<ModelReply, ModelError>;

    /// Per-call timeout for this model.
    fn timeout(&self) -> Duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_input_from_bytes_jpeg() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg");
        assert_eq!(input.media_type, "image/jpeg");
        assert_eq!(input.data, "/9j/");
    }

    #[test]
    fn test_image_input_unknown_format_defaults_to_jpeg() {
        let input = ImageInput::from_bytes(&[1, 2, 3], "tiff");
        assert_eq!(input.media_type, "image/jpeg");
    }

    #[test]
    fn test_identify_uses_config_sampling() {
        let image = ImageInput::from_bytes(&[1, 2, 3], "jpeg");
        let request = LlmRequest::identify(image, "What is this?".into(), &ModelConfig::default());
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.prompt, "What is this?");
    }

    #[test]
    fn test_candidate_blocked_by_rating_or_finish_reason() {
        let mut candidate = Candidate {
            safety_ratings: vec![SafetyRating {
                category: "HARM_CATEGORY_DANGEROUS_CONTENT".into(),
                probability: "HIGH".into(),
                blocked: true,
            }],
            ..Candidate::default()
        };
        assert!(candidate.is_blocked());

        candidate.safety_ratings[0].blocked = false;
        assert!(!candidate.is_blocked());

        candidate.finish_reason = Some("SAFETY".into());
        assert!(candidate.is_blocked());
    }
}
