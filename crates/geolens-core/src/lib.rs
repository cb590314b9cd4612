//! GeoLens Core - photo identification with a hosted vision model.
//!
//! GeoLens takes a photo (local file or URL), optionally with coordinates or
//! a free-text location, and asks a multimodal model to identify the place,
//! landmark or object it shows.
//!
//! # Architecture
//!
//! ```text
//! Image → Load/Fetch → Decode → Normalize (RGB, ≤800px) → Prompt → Gemini (retry on 429) → Text
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use geolens_core::{AnalysisRequest, Analyzer, Config, ImageSource};
//!
//! #[tokio::main]
//! async fn main() -> geolens_core::Result<()> {
//!     let config = Config::load()?;
//!     let analyzer = Analyzer::from_config(&config, None)?;
//!
//!     let request = AnalysisRequest::new(ImageSource::parse("./mosque.jpg"))
//!         .with_coordinates("23.7151° N", "90.4011° E");
//!     let analysis = analyzer.analyze(&request).await?;
//!     println!("{}", analysis.text);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod analyzer;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod types;

// Re-exports for convenient access
pub use analyzer::Analyzer;
pub use config::Config;
pub use error::{AnalysisError, AnalysisResult, ConfigError, GeoLensError, ModelError, Result};
pub use prompt::{Language, PromptBuilder, PromptTemplates};
pub use types::{Analysis, AnalysisRequest, Hints, ImageSource, Timings};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
