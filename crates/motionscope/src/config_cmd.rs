//! `motionscope config`: print and validate engine configuration.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use motionscope_core::{ConfigError, EngineConfig};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Toml,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print the built-in defaults.
    Defaults {
        #[arg(long, value_enum, default_value_t = Format::Toml)]
        format: Format,
    },

    /// Load a config file and report every problem in it.
    Check {
        path: PathBuf,

        /// Print the effective configuration after a successful check.
        #[arg(long, value_enum)]
        print: Option<Format>,
    },
}

pub fn render(config: &EngineConfig, format: Format) -> Result<String> {
    Ok(match format {
        Format::Toml => config.to_toml_string()?,
        Format::Json => serde_json::to_string_pretty(config)?,
    })
}

/// Load `path` and collect validation problems without failing on them.
pub fn check(path: &Path) -> Result<(EngineConfig, Vec<String>)> {
    let config = EngineConfig::from_file(path).map_err(|e| match e {
        ConfigError::Io { source, .. } => CliError::io(path, source),
        other => CliError::Config(other),
    })?;
    let problems = config.validate();
    Ok((config, problems))
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Defaults { format } => {
            print!("{}", render(&EngineConfig::default(), format)?);
            Ok(())
        }
        ConfigCommand::Check { path, print } => {
            let (config, problems) = check(&path)?;
            if !problems.is_empty() {
                for problem in &problems {
                    eprintln!("{}: {problem}", path.display());
                }
                return Err(CliError::Config(ConfigError::Invalid(problems)));
            }
            println!("{}: ok", path.display());
            if let Some(format) = print {
                print!("{}", render(&config, format)?);
            }
            Ok(())
        }
    }
}
