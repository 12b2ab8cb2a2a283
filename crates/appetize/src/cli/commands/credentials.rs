//! Credentials command

use clap::{Args, Subcommand};
use serde::Serialize;

use appetize_core::FileCredentialStore;
use appetize_publish::{CredentialStore, CREDENTIAL_KIND, PLACEHOLDER_ID};

use crate::cli::{output, Cli, OutputFormat};
use crate::exit_codes;

/// Inspect configured API tokens
#[derive(Debug, Args)]
pub struct CredentialsCommand {
    #[command(subcommand)]
    pub command: CredentialsSubcommand,
}

/// Credentials subcommands
#[derive(Debug, Subcommand)]
pub enum CredentialsSubcommand {
    /// List selectable API tokens
    List,
}

/// One selectable credential, as shown to the user
#[derive(Debug, Serialize)]
struct CredentialChoice {
    id: String,
    name: String,
}

impl CredentialsCommand {
    /// Execute the credentials command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        match self.command {
            CredentialsSubcommand::List => self.list(cli),
        }
    }

    fn list(&self, cli: &Cli) -> anyhow::Result<i32> {
        let config = cli.load_config()?;
        let store = FileCredentialStore::new(config.credentials_file()?);

        let mut choices = vec![CredentialChoice {
            id: PLACEHOLDER_ID.to_string(),
            name: "Placeholder API Token".to_string(),
        }];
        choices.extend(
            store
                .list_credentials(CREDENTIAL_KIND)?
                .into_iter()
                .map(|c| CredentialChoice {
                    name: c.display_name(),
                    id: c.id,
                }),
        );

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&choices)?);
            }
            OutputFormat::Text => {
                println!("{}", output::header("API tokens"));
                for choice in &choices {
                    println!("{}", output::key_value(&choice.id, &choice.name));
                }
            }
        }

        Ok(exit_codes::SUCCESS)
    }
}
