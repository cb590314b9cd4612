//! The `geolens config` command for configuration management.

use clap::{Args, Subcommand};
use geolens_core::Config;
use std::path::{Path, PathBuf};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
///
/// `explicit_path` is the `--config` file, when one was given; it replaces
/// the platform default for `path` and `init`.
pub fn execute(args: ConfigArgs, config: &Config, explicit_path: Option<&Path>) -> anyhow::Result<()> {
    let path = target_path(explicit_path);

    match args.command {
        ConfigCommand::Show => {
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            write_default(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn target_path(explicit_path: Option<&Path>) -> PathBuf {
    explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

/// Write the default configuration to `path`, creating parent directories.
fn write_default(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default(&path, false).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.image.max_dimension, 800);
        assert_eq!(loaded.retry.max_attempts, 3);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\nmax_attempts = 5\n").unwrap();

        let err = write_default(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("max_attempts = 5"));

        write_default(&path, true).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().retry.max_attempts, 3);
    }

    #[test]
    fn explicit_path_overrides_default() {
        let explicit = PathBuf::from("/etc/geolens/config.toml");
        assert_eq!(target_path(Some(&explicit)), explicit);
        assert_eq!(target_path(None), Config::default_path());
    }
}
