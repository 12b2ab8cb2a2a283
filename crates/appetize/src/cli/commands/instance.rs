//! Instance command

use clap::{Args, Subcommand};
use serde_json::json;

use appetize_core::InstanceId;

use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Inspect the identifier of this host
#[derive(Debug, Args)]
pub struct InstanceCommand {
    #[command(subcommand)]
    pub command: InstanceSubcommand,
}

/// Instance subcommands
#[derive(Debug, Subcommand)]
pub enum InstanceSubcommand {
    /// Print the instance identifier, creating it if needed
    Show,
}

impl InstanceCommand {
    /// Execute the instance command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        match self.command {
            InstanceSubcommand::Show => {
                let config = cli.load_config()?;
                let instance = InstanceId::load_or_create(&config.state_dir()?)?;

                match cli.format {
                    OutputFormat::Json => {
                        let value = json!({ "instanceId": instance.as_str() });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => println!("{}", instance),
                }
            }
        }

        Ok(exit_codes::SUCCESS)
    }
}
