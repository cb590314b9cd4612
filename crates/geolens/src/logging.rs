//! Logging setup for the CLI.
//!
//! Logs go to stderr so stdout carries only the analysis result.
//! `RUST_LOG` overrides the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber at `level`, as pretty text or JSON lines.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` section, with CLI flags taking
/// precedence.
pub fn init_from_config(
    config: &geolens_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = effective_level(&config.logging.level, verbose_override);
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

/// `--verbose` raises the level to debug but never lowers trace.
fn effective_level(configured: &str, verbose: bool) -> &str {
    if verbose && configured != "trace" {
        "debug"
    } else {
        configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_to_debug() {
        assert_eq!(effective_level("info", true), "debug");
        assert_eq!(effective_level("warn", false), "warn");
        assert_eq!(effective_level("trace", true), "trace");
    }
}
