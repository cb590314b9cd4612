//! Core request and result types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::prompt::Language;

/// Where the image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Local file on disk
    Path(PathBuf),
    /// Remote image fetched over HTTP(S)
    Url(String),
}

impl ImageSource {
    /// Interpret user input as a URL if it has an http(s) scheme, else as a path.
    pub fn parse(input: &str) -> Self {
        let lower = input.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageSource::Url(input.trim().to_string())
        } else {
            ImageSource::Path(PathBuf::from(input))
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, ImageSource::Url(_))
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => write!(f, "{}", path.display()),
            ImageSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Extra context that steers the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hints<'a> {
    /// No context beyond the image
    None,
    /// Latitude and longitude, both present, as given by the caller
    Coordinates { latitude: &'a str, longitude: &'a str },
    /// Free-text place such as a city, country or region
    Location(&'a str),
}

/// Everything needed to identify one image. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// The image to identify
    pub image: ImageSource,

    /// Display-formatted latitude, e.g. "23.7578° N"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,

    /// Display-formatted longitude, e.g. "90.3592° E"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,

    /// Free-text location hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Wider area the coordinates fall in, e.g. "Dhaka, Bangladesh"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Prompt language
    #[serde(default)]
    pub language: Language,
}

impl AnalysisRequest {
    pub fn new(image: ImageSource) -> Self {
        Self {
            image,
            latitude: None,
            longitude: None,
            location: None,
            region: None,
            language: Language::default(),
        }
    }

    pub fn with_coordinates(
        mut self,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        self.latitude = Some(latitude.into());
        self.longitude = Some(longitude.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// The prompt context this request carries.
    ///
    /// Coordinates win over a location hint, and only count when both halves
    /// are non-blank.
    pub fn hints(&self) -> Hints<'_> {
        match (non_blank(&self.latitude), non_blank(&self.longitude)) {
            (Some(latitude), Some(longitude)) => Hints::Coordinates {
                latitude,
                longitude,
            },
            _ => match non_blank(&self.location) {
                Some(location) => Hints::Location(location),
                None => Hints::None,
            },
        }
    }

    /// Region text, if any, for coordinate prompts.
    pub fn region(&self) -> Option<&str> {
        non_blank(&self.region)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Wall-clock timings for one analysis, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Fetch/read, decode and normalize
    pub image_load_ms: u64,
    /// All model attempts, including backoff sleeps
    pub generation_ms: u64,
    /// Whole operation
    pub total_ms: u64,
}

/// A successful identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// The model's identification text
    pub text: String,

    /// Model identifier that produced the text
    pub model: String,

    /// Number of model calls made (1 unless rate limited)
    pub attempts: u32,

    /// Tokens used (prompt + output), if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,

    /// Stage timings
    pub timings: Timings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_source_parse() {
        assert_eq!(
            ImageSource::parse("https://example.com/a.jpg"),
            ImageSource::Url("https://example.com/a.jpg".to_string())
        );
        assert!(ImageSource::parse("HTTP://example.com/a.jpg").is_url());
        assert_eq!(
            ImageSource::parse("photos/abc.jpg"),
            ImageSource::Path(PathBuf::from("photos/abc.jpg"))
        );
        // A file literally named like a scheme-less host is still a path
        assert!(!ImageSource::parse("httpbin.jpg").is_url());
    }

    #[test]
    fn test_hints_coordinates_need_both_halves() {
        let request = AnalysisRequest::new(ImageSource::parse("a.jpg"))
            .with_coordinates("23.7578° N", "90.3592° E");
        assert_eq!(
            request.hints(),
            Hints::Coordinates {
                latitude: "23.7578° N",
                longitude: "90.3592° E"
            }
        );

        let mut half = request.clone();
        half.longitude = None;
        assert_eq!(half.hints(), Hints::None);

        let mut blank = request;
        blank.latitude = Some("  ".to_string());
        assert_eq!(blank.hints(), Hints::None);
    }

    #[test]
    fn test_hints_location_fallback() {
        let mut request =
            AnalysisRequest::new(ImageSource::parse("a.jpg")).with_location("Kyoto, Japan");
        assert_eq!(request.hints(), Hints::Location("Kyoto, Japan"));

        // Coordinates take precedence over the location hint
        request = request.with_coordinates("35.0", "135.7");
        assert!(matches!(request.hints(), Hints::Coordinates { .. }));
    }

    #[test]
    fn test_analysis_serializes_timings() {
        let analysis = Analysis {
            text: "Sat Gambuj Mosque".to_string(),
            model: "gemini-2.0-flash".to_string(),
            attempts: 1,
            tokens_used: None,
            timings: Timings {
                image_load_ms: 12,
                generation_ms: 900,
                total_ms: 915,
            },
        };
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["timings"]["generation_ms"], 900);
        assert!(json.get("tokens_used").is_none());
    }
}
