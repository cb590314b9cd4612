//! Google Gemini provider using the `generateContent` REST API.
//!
//! Sends the prompt and an inline base64 image in a single user turn.

use super::provider::{Candidate, LlmRequest, ModelReply, SafetyRating, VisionModel};
use super::retry;
use crate::config::ModelConfig;
use crate::error::{ConfigError, ModelError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini provider.
pub struct GeminiProvider {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Create a provider from config, resolving `${ENV_VAR}` API keys.
    ///
    /// `model_override` replaces the configured model name when given.
    pub fn from_config(
        config: &ModelConfig,
        model_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            ConfigError::ValidationError(
                "Gemini API key not set. Set GOOGLE_API_KEY env var.".to_string(),
            )
        })?;
        let model = model_override.unwrap_or(&config.model);
        Ok(Self::new(
            &config.endpoint,
            &api_key,
            model,
            Duration::from_millis(config.timeout_ms),
        ))
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseCandidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<ResponseSafetyRating>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseSafetyRating {
    #[serde(default)]
    category: String,
    #[serde(default)]
    probability: String,
    #[serde(default)]
    blocked: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GenerateContentResponse {
    fn into_reply(self, fallback_model: &str) -> ModelReply {
        let candidates: Vec<Candidate> = self
            .candidates
            .into_iter()
            .map(|c| Candidate {
                parts: c
                    .content
                    .map(|content| content.parts.into_iter().map(|p| p.text).collect())
                    .unwrap_or_default(),
                safety_ratings: c
                    .safety_ratings
                    .into_iter()
                    .map(|r| SafetyRating {
                        category: r.category,
                        probability: r.probability,
                        blocked: r.blocked,
                    })
                    .collect(),
                finish_reason: c.finish_reason,
            })
            .collect();

        // Direct text mirrors the SDK accessor: all text parts of the first
        // candidate, unless that candidate was withheld.
        let text = candidates
            .first()
            .filter(|c| !c.is_blocked())
            .map(|c| c.parts.iter().flatten().map(String::as_str).collect::<String>())
            .filter(|t| !t.trim().is_empty());

        ModelReply {
            text,
            candidates,
            block_reason: self.prompt_feedback.and_then(|f| f.block_reason),
            model: self
                .model_version
                .unwrap_or_else(|| fallback_model.to_string()),
            tokens_used: self.usage_metadata.and_then(|u| u.total_token_count),
        }
    }
}

/// Turn a non-success HTTP response into a [`ModelError`].
fn error_from_response(
    status: reqwest::StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> ModelError {
    let detail = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{} ({})", envelope.error.message, envelope.error.status),
        Err(_) => body.to_string(),
    };
    let retry_after = retry_after.or_else(|| retry::parse_retry_delay(body));
    ModelError::http(status.as_u16(), format!("Gemini HTTP {status}: {detail}"))
        .with_retry_after(retry_after)
}

#[async_trait]
impl VisionModel for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &LlmRequest) -> Result<ModelReply, ModelError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.image.media_type.clone(),
                            data: request.image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::new(format!("Gemini request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(retry::parse_retry_after_header);
            let text = resp.text().await.unwrap_or_default();
            return Err(error_from_response(status, retry_after, &text));
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| ModelError::new(format!("Failed to parse Gemini response: {e}")))?;

        Ok(parsed.into_reply(&self.model))
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ImageInput;
    use mockito::Matcher;

    fn provider(server: &mockito::Server) -> GeminiProvider {
        GeminiProvider::new(
            &format!("{}/v1beta/", server.url()),
            "test-key",
            "gemini-2.0-flash",
            Duration::from_secs(5),
        )
    }

    fn request() -> LlmRequest {
        LlmRequest {
            image: ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg"),
            prompt: "Identify this landmark.".to_string(),
            max_tokens: 1000,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "Identify this landmark."},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/"}}
                    ]
                }],
                "generationConfig": {"temperature": 0.0, "maxOutputTokens": 1000}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                  "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Sixty Dome "}, {"text": "Mosque"}]},
                    "finishReason": "STOP",
                    "safetyRatings": [{"category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE"}]
                  }],
                  "usageMetadata": {"promptTokenCount": 300, "candidatesTokenCount": 12, "totalTokenCount": 312},
                  "modelVersion": "gemini-2.0-flash-001"
                }"#,
            )
            .create_async()
            .await;

        let reply = provider(&server).generate(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.text.as_deref(), Some("Sixty Dome Mosque"));
        assert_eq!(reply.candidates.len(), 1);
        assert_eq!(reply.candidates[0].parts.len(), 2);
        assert_eq!(reply.model, "gemini-2.0-flash-001");
        assert_eq!(reply.tokens_used, Some(312));
    }

    #[tokio::test]
    async fn test_generate_safety_blocked_candidate_has_no_direct_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"candidates": [{
                    "finishReason": "SAFETY",
                    "safetyRatings": [{"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH", "blocked": true}]
                }]}"#,
            )
            .create_async()
            .await;

        let reply = provider(&server).generate(&request()).await.unwrap();

        assert!(reply.text.is_none());
        assert!(reply.candidates[0].is_blocked());
        assert!(reply.candidates[0].safety_ratings[0].blocked);
        assert_eq!(reply.model, "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_generate_prompt_feedback_block() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"promptFeedback": {"blockReason": "OTHER"}}"#)
            .create_async()
            .await;

        let reply = provider(&server).generate(&request()).await.unwrap();
        assert!(reply.candidates.is_empty());
        assert_eq!(reply.block_reason.as_deref(), Some("OTHER"));
    }

    #[tokio::test]
    async fn test_generate_rate_limited_with_retry_info() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body(
                r#"{"error": {
                    "code": 429,
                    "message": "You exceeded your current quota.",
                    "status": "RESOURCE_EXHAUSTED",
                    "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "21s"}]
                }}"#,
            )
            .create_async()
            .await;

        let err = provider(&server).generate(&request()).await.unwrap_err();

        assert_eq!(err.status_code, Some(429));
        assert_eq!(err.retry_after, Some(Duration::from_secs(21)));
        assert!(err.message.contains("exceeded your current quota"));
        assert!(err.message.contains("RESOURCE_EXHAUSTED"));
        assert!(retry::is_rate_limited(&err));
    }

    #[tokio::test]
    async fn test_generate_retry_after_header() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_header("retry-after", "4")
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let err = provider(&server).generate(&request()).await.unwrap_err();
        assert_eq!(err.retry_after, Some(Duration::from_secs(4)));
    }

    #[tokio::test]
    async fn test_generate_auth_error_not_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#)
            .create_async()
            .await;

        let err = provider(&server).generate(&request()).await.unwrap_err();
        assert_eq!(err.status_code, Some(400));
        assert!(err.message.contains("API key not valid"));
        assert!(!retry::is_rate_limited(&err));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = ModelConfig {
            api_key: "${DEFINITELY_NOT_SET_GEOLENS_KEY}".to_string(),
            ..ModelConfig::default()
        };
        let err = GeminiProvider::from_config(&config, None).err().unwrap();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_from_config_model_override() {
        let config = ModelConfig {
            api_key: "literal-key".to_string(),
            ..ModelConfig::default()
        };
        let provider = GeminiProvider::from_config(&config, Some("gemini-2.5-flash")).unwrap();
        assert_eq!(provider.model(), "gemini-2.5-flash");
        assert_eq!(provider.timeout(), Duration::from_secs(60));
        assert!(provider.url().ends_with("/models/gemini-2.5-flash:generateContent"));
    }
}
