//! Text extraction from a model reply.

use super::provider::ModelReply;
use crate::error::{AnalysisError, AnalysisResult};

/// Pull the identification text out of `reply`.
///
/// Order of preference:
/// 1. the direct text accessor, if non-empty;
/// 2. the first candidate: a safety block wins, otherwise the text of its
///    first content part;
/// 3. a prompt-level block reason.
///
/// With nothing usable the result is [`AnalysisError::EmptyResponse`].
pub fn extract_text(reply: &ModelReply) -> AnalysisResult<String> {
    if let Some(text) = non_empty(reply.text.as_deref()) {
        return Ok(text.to_string());
    }

    if let Some(candidate) = reply.candidates.first() {
        if candidate.is_blocked() {
            return Err(AnalysisError::SafetyBlocked);
        }
        let first_part = candidate.parts.first().and_then(|p| p.as_deref());
        if let Some(text) = non_empty(first_part) {
            return Ok(text.to_string());
        }
    }

    if let Some(reason) = &reply.block_reason {
        tracing::warn!("Prompt blocked by the model provider: {reason}");
        return Err(AnalysisError::SafetyBlocked);
    }

    Err(AnalysisError::EmptyResponse)
}

/// `text` unchanged, unless it is missing or only whitespace.
fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}
