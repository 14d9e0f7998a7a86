//! Keychain command

use clap::{Args, Subcommand};

use gantry_signing::Keychain;

use crate::cli::{output, Cli, OutputFormat};

use super::require_macos;

/// Keychain lifecycle operations
#[derive(Debug, Args)]
pub struct KeychainCommand {
    #[command(subcommand)]
    pub command: KeychainSubcommand,
}

/// Keychain subcommands
#[derive(Debug, Subcommand)]
pub enum KeychainSubcommand {
    /// Delete an ephemeral keychain (CI teardown)
    Delete(DeleteCommand),
}

/// Delete an ephemeral keychain
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Keychain to delete
    #[arg(long, env = "GANTRY_KEYCHAIN_NAME")]
    pub keychain_name: String,
}

impl KeychainCommand {
    /// Execute the keychain command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        require_macos("keychain management")?;

        let rt = tokio::runtime::Runtime::new()?;
        match &self.command {
            KeychainSubcommand::Delete(cmd) => rt.block_on(cmd.execute(cli)),
        }
    }
}

impl DeleteCommand {
    async fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        // Deletion never prompts for the store password.
        let keychain = Keychain::new(&self.keychain_name, "")?;
        keychain.delete_keychain().await?;

        match cli.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "deleted": keychain.canonical_name() });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success(&format!("Deleted keychain {}", keychain.canonical_name()));
                }
            }
        }

        Ok(())
    }
}
