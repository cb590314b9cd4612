//! GeoLens CLI - identify places and landmarks in photos.
//!
//! Sends a photo, plus optional coordinates or a location hint, to a hosted
//! vision model and prints what it identifies.
//!
//! # Usage
//!
//! ```bash
//! # Identify a local photo
//! geolens analyze mosque.jpg
//!
//! # With coordinates, in Simplified Chinese
//! geolens analyze https://example.com/photo.jpg --lat "23.7151° N" --lon "90.4011° E" --language chinese
//!
//! # With a free-text location hint, JSON output
//! geolens analyze photo.jpg --location "Dhaka, Bangladesh" --format json
//!
//! # View configuration
//! geolens config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// GeoLens - identify places and landmarks in photos with a hosted vision model.
#[derive(Parser, Debug)]
#[command(name = "geolens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, env = "GEOLENS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Identify the place or landmark in a photo
    Analyze(cli::analyze::AnalyzeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => geolens_core::Config::load_from(path)?,
        None => match geolens_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `geolens config path`."
                );
                geolens_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("GeoLens v{}", geolens_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()),
    }
}
