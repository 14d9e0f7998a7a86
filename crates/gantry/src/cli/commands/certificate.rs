//! Certificate command

use clap::Args;
use tracing::info;

use gantry_signing::{prepare_keychain_with_developer_certificate, Keychain};

use crate::cli::{output, Cli, OutputFormat};

use super::{generate_keychain_password, require_macos};

/// Provision a keychain with a developer certificate
#[derive(Debug, Args)]
pub struct CertificateCommand {
    /// Base64-encoded developer certificate secret (PEM certificate,
    /// optionally concatenated with its private key)
    #[arg(long, env = "GANTRY_SECRET_VALUE", hide_env_values = true)]
    pub secret_value: String,

    /// Keychain to provision; created if it does not exist
    #[arg(long, env = "GANTRY_KEYCHAIN_NAME", default_value = "gantry-ci")]
    pub keychain_name: String,

    /// Keychain password; a random one is generated when omitted
    #[arg(long, env = "GANTRY_KEYCHAIN_PASSWORD", hide_env_values = true)]
    pub keychain_password: Option<String>,
}

impl CertificateCommand {
    /// Execute the certificate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        require_macos("certificate provisioning")?;

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        output::mask_secret(&self.secret_value);

        let password = match &self.keychain_password {
            Some(password) => password.clone(),
            None => generate_keychain_password(),
        };
        output::mask_secret(&password);

        info!(keychain = %self.keychain_name, "provisioning developer certificate");

        let keychain = Keychain::new(&self.keychain_name, &password)?;
        prepare_keychain_with_developer_certificate(&self.secret_value, &keychain).await?;

        match cli.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "keychain": keychain.canonical_name(),
                    "path": keychain.path(),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success(&format!(
                        "Keychain {} ready for code signing",
                        keychain.canonical_name()
                    ));
                    println!("{}", output::key_value("path", &keychain.path().display().to_string()));
                }
            }
        }

        Ok(())
    }
}
