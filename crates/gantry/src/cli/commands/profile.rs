//! Profile command

use clap::Args;

use gantry_signing::install_provisioning_profile;

use crate::cli::{output, Cli, OutputFormat};

use super::require_macos;

/// Install a provisioning profile
#[derive(Debug, Args)]
pub struct ProfileCommand {
    /// Base64-encoded provisioning profile
    #[arg(long, env = "GANTRY_SECRET_VALUE", hide_env_values = true)]
    pub secret_value: String,
}

impl ProfileCommand {
    /// Execute the profile command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        require_macos("provisioning-profile installation")?;

        output::mask_secret(&self.secret_value);
        let path = install_provisioning_profile(&self.secret_value)?;

        match cli.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "path": path });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success("Provisioning profile installed");
                    println!("{}", output::key_value("path", &path.display().to_string()));
                }
            }
        }

        Ok(())
    }
}
