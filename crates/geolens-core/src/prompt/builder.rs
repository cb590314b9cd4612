//! Prompt assembly from templates and request hints.

use super::templates::{PromptTemplate, PromptTemplates};
use crate::config::PromptsConfig;
use crate::error::ConfigError;
use crate::types::{AnalysisRequest, Hints};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Appended to every basic prompt.
const FEATURE_FOCUS: &str = "Describe key architectural features like number of domes, \
minarets, presence of a tank or water body, and any unique elements.";

/// Appended to every coordinate prompt.
const COORDINATE_FOCUS: &str = "Describe key architectural features like number of domes, \
minarets, presence of a tank or water body, and any unique elements to help identify the \
specific building or site at these coordinates. Provide a detailed historical overview \
including construction date, builder, architectural style details, historical context, \
and significance.";

/// Structured identification instructions for coordinate prompts.
const COORDINATE_INSTRUCTIONS: &str = "Please identify:
1. The exact name of the landmark, building, or place at these coordinates
2. Specific architectural or landmark details visible in the image that support it
3. Your confidence level in this identification
4. If nothing at these coordinates matches the image, reply \"not found at {latitude}, {longitude}\"

Be specific and factual. Do not speculate; if unsure, say so.";

/// Builds the text prompt for a request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    templates: PromptTemplates,
    default_language: String,
    fallback: PromptTemplate,
}

impl PromptBuilder {
    /// Create a builder, checking that the store can serve the default language.
    pub fn new(templates: PromptTemplates, default_language: &str) -> Result<Self, ConfigError> {
        let fallback = templates
            .get(default_language)
            .cloned()
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "prompt templates have no entry for default language '{default_language}'"
                ))
            })?;
        Ok(Self {
            templates,
            default_language: default_language.to_string(),
            fallback,
        })
    }

    /// Build from configuration: the configured template file, or the built-in set.
    pub fn from_config(config: &PromptsConfig) -> Result<Self, ConfigError> {
        let templates = match config.resolved_path() {
            Some(path) => {
                tracing::debug!("Loading prompt templates from {}", path.display());
                PromptTemplates::load_from(&path)?
            }
            None => PromptTemplates::builtin(),
        };
        Self::new(templates, &config.default_language)
    }

    /// Render the prompt for `request`.
    pub fn build(&self, request: &AnalysisRequest) -> String {
        let template = self.template_for(request);

        match request.hints() {
            Hints::Coordinates {
                latitude,
                longitude,
            } => {
                let lead = match request.region() {
                    Some(region) => format!(
                        "The image is taken at the exact coordinates {latitude}, {longitude} in {region}."
                    ),
                    None => format!(
                        "The image is taken at the exact coordinates {latitude}, {longitude}."
                    ),
                };
                let body = fill_coordinates(&template.with_coordinates, latitude, longitude);
                let instructions = fill_coordinates(COORDINATE_INSTRUCTIONS, latitude, longitude);
                format!("{lead} {body} {COORDINATE_FOCUS}\n\n{instructions}")
            }
            Hints::Location(location) => match &template.with_location {
                Some(with_location) => format!(
                    "{} {FEATURE_FOCUS}",
                    fill_placeholders(with_location, |name| (name == "location").then_some(location))
                ),
                None => format!(
                    "Analyze this image with the context that it might be from: {location}. \
                     If the image content is not found in {location}, reply \"not found in {location}\".\n\n{} {FEATURE_FOCUS}",
                    template.basic
                ),
            },
            Hints::None => format!("{} {FEATURE_FOCUS}", template.basic),
        }
    }

    fn template_for(&self, request: &AnalysisRequest) -> &PromptTemplate {
        self.templates
            .select(request.language, &self.default_language)
            .unwrap_or(&self.fallback)
    }
}

fn fill_coordinates(template: &str, latitude: &str, longitude: &str) -> String {
    fill_placeholders(template, |name| match name {
        "latitude" => Some(latitude),
        "longitude" => Some(longitude),
        _ => None,
    })
}

/// Substitute `{name}` placeholders in a single pass, so inserted values are
/// never scanned again. Names `value` does not know are left as written.
fn fill_placeholders<'a>(template: &str, value: impl Fn(&str) -> Option<&'a str>) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));
    re.replace_all(template, |caps: &Captures| {
        value(&caps[1])
            .map(str::to_string)
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}
