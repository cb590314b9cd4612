//! The `geolens analyze` command.

use anyhow::Context;
use clap::{Args, ValueEnum};
use dialoguer::{theme::ColorfulTheme, Input};
use geolens_core::{
    Analysis, AnalysisError, AnalysisRequest, Analyzer, Config, ImageSource, Language, Timings,
};
use serde::Serialize;

/// Supported output formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The identification text only
    #[default]
    Text,
    /// A JSON object with text, model, attempts and timings
    Json,
}

/// Arguments for the `analyze` command.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Image file path or http(s) URL
    #[arg(required = true)]
    pub image: String,

    /// Latitude as display text, e.g. "23.7151° N" (needs --lon)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<String>,

    /// Longitude as display text, e.g. "90.4011° E" (needs --lat)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<String>,

    /// Free-text location hint, e.g. "Dhaka, Bangladesh"
    #[arg(short, long)]
    pub location: Option<String>,

    /// Wider area the coordinates fall in, added to coordinate prompts
    #[arg(long)]
    pub region: Option<String>,

    /// Prompt language: english, chinese or traditional_chinese
    #[arg(short = 'L', long)]
    pub language: Option<String>,

    /// Ask for a location hint interactively
    #[arg(long, conflicts_with = "location")]
    pub ask_location: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Model name (overrides config)
    #[arg(short, long, env = "GEOLENS_MODEL")]
    pub model: Option<String>,
}

/// JSON record printed for `--format json`.
#[derive(Debug, Serialize)]
struct OutputRecord<'a> {
    image: String,
    language: Language,
    #[serde(flatten)]
    outcome: Outcome<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outcome<'a> {
    Success {
        text: &'a str,
        model: &'a str,
        attempts: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        tokens_used: Option<u32>,
        timings: Timings,
    },
    Failure {
        error: ErrorRecord,
    },
}

#[derive(Debug, Serialize)]
struct ErrorRecord {
    kind: &'static str,
    message: String,
}

impl<'a> Outcome<'a> {
    fn from_result(result: &'a Result<Analysis, AnalysisError>) -> Self {
        match result {
            Ok(analysis) => Outcome::Success {
                text: &analysis.text,
                model: &analysis.model,
                attempts: analysis.attempts,
                tokens_used: analysis.tokens_used,
                timings: analysis.timings,
            },
            Err(e) => Outcome::Failure {
                error: ErrorRecord {
                    kind: e.kind(),
                    message: e.to_string(),
                },
            },
        }
    }
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let location = if args.ask_location {
        ask_location()?
    } else {
        args.location.clone()
    };

    let request = build_request(&args, location, config);
    let analyzer = Analyzer::from_config(config, args.model.as_deref())
        .context("Failed to set up the vision model client")?;
    tracing::debug!("Using model {}", analyzer.model_name());

    let result = analyzer.analyze(&request).await;

    if args.format == OutputFormat::Json {
        let record = OutputRecord {
            image: request.image.to_string(),
            language: request.language,
            outcome: Outcome::from_result(&result),
        };
        println!("{}", serde_json::to_string_pretty(&record)?);
    }

    match result {
        Ok(analysis) => {
            if args.format == OutputFormat::Text {
                println!("{}", analysis.text);
            }
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("Could not analyze {}", request.image))),
    }
}

/// Assemble the request from command-line arguments.
fn build_request(args: &AnalyzeArgs, location: Option<String>, config: &Config) -> AnalysisRequest {
    let language = Language::parse_or_default(
        args.language
            .as_deref()
            .unwrap_or(config.prompts.default_language.as_str()),
    );

    let mut request = AnalysisRequest::new(ImageSource::parse(&args.image)).with_language(language);

    match (&args.lat, &args.lon) {
        (Some(lat), Some(lon)) => request = request.with_coordinates(lat, lon),
        (None, None) => {}
        _ => tracing::warn!("Both --lat and --lon are needed; ignoring the coordinate given"),
    }
    if let Some(location) = location {
        request = request.with_location(location);
    }
    if let Some(region) = &args.region {
        request = request.with_region(region);
    }
    request
}

/// Prompt on the terminal for a location; empty input means none.
fn ask_location() -> anyhow::Result<Option<String>> {
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Where might this photo be from? (leave empty to skip)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read location")?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}
