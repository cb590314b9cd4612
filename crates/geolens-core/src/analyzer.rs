//! The analysis entry point: prepare the image, build the prompt, call the
//! model with rate-limit retry, and extract the text.

use std::time::Instant;

use crate::config::{Config, ModelConfig, RetryConfig};
use crate::error::{AnalysisError, AnalysisResult, ConfigError};
use crate::llm::{extract_text, retry, GeminiProvider, LlmRequest, ModelReply, VisionModel};
use crate::pipeline::ImagePreparer;
use crate::prompt::PromptBuilder;
use crate::types::{Analysis, AnalysisRequest, Timings};

/// Identifies images with a vision model.
///
/// Built once from a [`Config`] and reused for any number of requests. Holds
/// no per-request state, so concurrent `analyze` calls are independent.
pub struct Analyzer {
    model_config: ModelConfig,
    retry: RetryConfig,
    prompts: PromptBuilder,
    preparer: ImagePreparer,
    model: Box<dyn VisionModel>,
}

impl Analyzer {
    /// Create an analyzer around an existing model client.
    pub fn new(config: &Config, model: Box<dyn VisionModel>) -> Result<Self, ConfigError> {
        Ok(Self {
            model_config: config.model.clone(),
            retry: config.retry.clone(),
            prompts: PromptBuilder::from_config(&config.prompts)?,
            preparer: ImagePreparer::new(&config.image),
            model,
        })
    }

    /// Create an analyzer that talks to Gemini.
    pub fn from_config(config: &Config, model_override: Option<&str>) -> Result<Self, ConfigError> {
        let provider = GeminiProvider::from_config(&config.model, model_override)?;
        Self::new(config, Box::new(provider))
    }

    /// Model identifier requests are sent to.
    pub fn model_name(&self) -> &str {
        self.model.model()
    }

    /// The prompt that would be sent for `request`.
    pub fn prompt_for(&self, request: &AnalysisRequest) -> String {
        self.prompts.build(request)
    }

    /// Identify the image in `request`.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<Analysis> {
        let started = Instant::now();
        tracing::debug!("Analyzing {} ({})", request.image, request.language);

        let prepared = self.preparer.prepare(&request.image).await?;
        let image_load = started.elapsed();
        tracing::debug!(
            "Prepared image {}x{} -> {}x{}",
            prepared.original_size.0,
            prepared.original_size.1,
            prepared.size.0,
            prepared.size.1
        );

        let prompt = self.prompts.build(request);
        let llm_request = LlmRequest::identify(prepared.input, prompt, &self.model_config);

        let generation_started = Instant::now();
        let (reply, attempts) = self.generate_with_retry(&llm_request).await?;
        let generation = generation_started.elapsed();

        let text = extract_text(&reply)?;

        let timings = Timings {
            image_load_ms: image_load.as_millis() as u64,
            generation_ms: generation.as_millis() as u64,
            total_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            image_load_ms = timings.image_load_ms,
            generation_ms = timings.generation_ms,
            total_ms = timings.total_ms,
            attempts,
            "Analysis complete"
        );

        let model = if reply.model.is_empty() {
            self.model.model().to_string()
        } else {
            reply.model
        };

        Ok(Analysis {
            text,
            model,
            attempts,
            tokens_used: reply.tokens_used,
            timings,
        })
    }

    /// Call the model, retrying only when rate limited.
    ///
    /// Attempts are sequential, so at most one call is in flight. Returns the
    /// reply together with the number of calls made.
    async fn generate_with_retry(&self, request: &LlmRequest) -> AnalysisResult<(ModelReply, u32)> {
        let max_attempts = self.retry.max_attempts.max(1);
        let timeout = self.model.timeout();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let error = match tokio::time::timeout(timeout, self.model.generate(request)).await {
                Ok(Ok(reply)) => return Ok((reply, attempt)),
                Ok(Err(e)) => e,
                Err(_) => {
                    return Err(AnalysisError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    })
                }
            };

            if !retry::is_rate_limited(&error) {
                tracing::debug!("{} call failed: {error}", self.model.name());
                return Err(AnalysisError::Model(error));
            }

            if attempt >= max_attempts {
                return Err(AnalysisError::RateLimited {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = retry::retry_delay(&error, attempt - 1, &self.retry);
            tracing::warn!(
                "Rate limit hit (attempt {attempt}/{max_attempts}), waiting {:.1}s before retrying",
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
        }
    }
}
