//! Vision model integration.
//!
//! A provider trait with a Gemini implementation, rate-limit classification
//! for the retry loop, and the fallback chain that pulls text out of a reply.

pub mod extract;
pub mod gemini;
pub mod provider;
pub mod retry;

pub use extract::extract_text;
pub use gemini::GeminiProvider;
pub use provider::{Candidate, ImageInput, LlmRequest, ModelReply, SafetyRating, VisionModel};
