//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use appetize_core::config::{load_config, load_config_or_default};
use appetize_core::Config;

use commands::{CredentialsCommand, InitCommand, InstanceCommand, PublishCommand, RecordCommand};

/// appetize - publish mobile builds to Appetize.io
#[derive(Debug, Parser)]
#[command(name = "appetize")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (skips the directory search)
    #[arg(long, global = true, env = "APPETIZE_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Write a starter configuration file
    Init(InitCommand),

    /// Publish a build to Appetize.io
    Publish(PublishCommand),

    /// Inspect configured API tokens
    Credentials(CredentialsCommand),

    /// Inspect the identifier of this host
    Instance(InstanceCommand),

    /// Inspect recorded publishes
    Record(RecordCommand),
}

impl Cli {
    /// Execute the CLI command, returning the process exit code
    pub fn execute(self) -> anyhow::Result<i32> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Init(ref cmd) => cmd.execute(&self),
            Commands::Publish(ref cmd) => cmd.execute(&self),
            Commands::Credentials(ref cmd) => cmd.execute(&self),
            Commands::Instance(ref cmd) => cmd.execute(&self),
            Commands::Record(ref cmd) => cmd.execute(&self),
        }
    }

    /// Load configuration from `--config` or by searching the working directory
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => {
                let cwd = std::env::current_dir()?;
                let (config, path) = load_config_or_default(&cwd)?;
                if let Some(path) = path {
                    debug!(path = %path.display(), "using config file");
                }
                config
            }
        };
        Ok(config)
    }

    /// Whether human-readable progress should be printed
    pub fn show_progress(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }
}
