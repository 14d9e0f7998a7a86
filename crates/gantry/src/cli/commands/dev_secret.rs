//! Dev-secret command

use clap::Args;

use gantry_signing::{generate_test_certificate, SystemRunner};

use crate::cli::{output, Cli, OutputFormat};

/// Mint a self-signed developer-certificate secret for smoke tests
///
/// Generates an RSA key and self-signed certificate with openssl,
/// combines them into one PEM blob and prints it base64-encoded, the
/// shape a real developer-certificate secret arrives in from CI.
#[derive(Debug, Args)]
pub struct DevSecretCommand {}

impl DevSecretCommand {
    /// Execute the dev-secret command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let staging = tempfile::tempdir()?;
        let secret = generate_test_certificate(
            &SystemRunner,
            &staging.path().join("dev-key.pem"),
            &staging.path().join("dev-crt.pem"),
        )
        .await?;

        output::mask_secret(&secret);

        match cli.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "developer-certificate-secret": secret });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    output::info("Self-signed developer-certificate secret (base64):");
                }
                println!("{secret}");
            }
        }

        Ok(())
    }
}
