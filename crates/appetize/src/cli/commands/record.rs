//! Record command

use std::path::PathBuf;

use clap::{Args, Subcommand};

use appetize_core::FileRecordSink;

use crate::cli::{output, Cli, OutputFormat};
use crate::exit_codes;

/// Inspect recorded publishes
#[derive(Debug, Args)]
pub struct RecordCommand {
    #[command(subcommand)]
    pub command: RecordSubcommand,
}

/// Record subcommands
#[derive(Debug, Subcommand)]
pub enum RecordSubcommand {
    /// Show the record of a published build
    Show(ShowCommand),
}

/// Show the record of a published build
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Build number (defaults to the most recently published build)
    #[arg(long)]
    pub build_number: Option<u64>,

    /// Workspace directory (defaults to the working directory)
    #[arg(long, env = "WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Also print the embeddable HTML snippet
    #[arg(long)]
    pub embed: bool,
}

impl RecordCommand {
    /// Execute the record command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        match &self.command {
            RecordSubcommand::Show(cmd) => cmd.execute(cli),
        }
    }
}

impl ShowCommand {
    fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        let config = cli.load_config()?;
        let workspace = match &self.workspace {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let dir = config.records.dir_in(&workspace);
        let sink = FileRecordSink::new(&dir, None);

        let record = match self.build_number {
            Some(number) => sink.load(number)?,
            None => sink.latest()?,
        };
        let Some(record) = record else {
            match self.build_number {
                Some(number) => anyhow::bail!(
                    "No Appetize.io record for build {} in {}",
                    number,
                    dir.display()
                ),
                None => anyhow::bail!("No Appetize.io records in {}", dir.display()),
            }
        };

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            OutputFormat::Text => {
                println!(
                    "{}",
                    output::header(&format!(
                        "Build {} ({})",
                        record.build_number, record.app.platform
                    ))
                );
                println!(
                    "{}",
                    output::key_value("Published", &record.published_at.to_rfc3339())
                );
                for (key, value) in record.env_vars() {
                    println!("{}", output::key_value(key, &value));
                }
                if self.embed {
                    let html = record.app.embed_html();
                    if !html.is_empty() {
                        println!();
                        println!("{}", html);
                    }
                }
            }
        }

        Ok(exit_codes::SUCCESS)
    }
}
