//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{CalculateCommand, VersionCommand};

/// Gantry - release planning for multi-module repositories
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Include per-module file change listings in output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Calculate the next release and emit its manifest
    Calculate(CalculateCommand),

    /// Show a module's current or projected version
    Version(VersionCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Calculate(ref cmd) => cmd.execute(&self),
            Commands::Version(ref cmd) => cmd.execute(&self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_calculate() {
        let cli = Cli::parse_from(["gantry", "calculate", "--preview", "rc", "-o", "out.json"]);
        match cli.command {
            Commands::Calculate(cmd) => {
                assert_eq!(cmd.preview.as_deref(), Some("rc"));
                assert_eq!(cmd.output.as_deref(), Some(std::path::Path::new("out.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_version_defaults_to_root() {
        let cli = Cli::parse_from(["gantry", "version"]);
        match cli.command {
            Commands::Version(cmd) => {
                assert_eq!(cmd.module, ".");
                assert!(!cmd.unreleased);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
