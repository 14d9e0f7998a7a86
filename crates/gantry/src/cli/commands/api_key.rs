//! API key command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gantry_signing::{
    api_key::{decode_envelope, materialize},
    ApiKeyRecord, KeyLayout, ProvisionError,
};

use crate::cli::{output, Cli, OutputFormat};

/// Decode or assemble an App Store Connect API key and write it out
///
/// The key arrives either as a single base64 JSON envelope
/// (`--secret-value`) or as its three parts (`--key-id`, `--issuer-id`,
/// `--base64-private-key`). This command is a pure codec plus file
/// writes and runs on any platform.
#[derive(Debug, Args)]
pub struct ApiKeyCommand {
    /// Base64-encoded JSON envelope holding the full key record
    #[arg(long, env = "GANTRY_SECRET_VALUE", hide_env_values = true)]
    pub secret_value: Option<String>,

    /// Key identifier, used with --issuer-id and --base64-private-key
    #[arg(long, env = "GANTRY_API_KEY_ID")]
    pub key_id: Option<String>,

    /// Issuer identifier
    #[arg(long, env = "GANTRY_API_ISSUER_ID")]
    pub issuer_id: Option<String>,

    /// Base64-encoded private key text
    #[arg(long, env = "GANTRY_API_PRIVATE_KEY", hide_env_values = true)]
    pub base64_private_key: Option<String>,

    /// Destination directory; defaults to the selected layout's own
    /// resolution rule
    #[arg(long)]
    pub destination: Option<PathBuf>,

    /// Write the legacy dot-file layout under RUNNER_TEMP instead of
    /// keyinfo.json + AuthKey_<keyId>.p8
    #[arg(long)]
    pub legacy_layout: bool,
}

impl ApiKeyCommand {
    /// Execute the api-key command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let record = self.resolve_record()?;
        output::mask_secret(&record.private_key);

        let layout = if self.legacy_layout {
            KeyLayout::RunnerTemp {
                dir: self.destination.clone(),
            }
        } else {
            KeyLayout::PrivateKeys {
                dir: self.destination.clone(),
            }
        };

        info!(key_id = %record.key_id, "materializing App Store Connect API key");
        let written = materialize(&record, layout)?;

        let key_path = written.key_path.display().to_string();
        output::set_output("app-store-connect-api-key-key-path", &key_path);
        output::set_output("app-store-connect-api-key-key-id", &record.key_id);
        output::set_output("app-store-connect-api-key-issuer-id", &record.issuer_id);

        match cli.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "keyId": record.key_id,
                    "issuerId": record.issuer_id,
                    "keyPath": written.key_path,
                    "infoPath": written.info_path,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success("App Store Connect API key installed");
                    println!("{}", output::key_value("key", &key_path));
                    println!(
                        "{}",
                        output::key_value("info", &written.info_path.display().to_string())
                    );
                }
            }
        }

        Ok(())
    }

    /// Envelope input wins when present; otherwise all three discrete
    /// parts are required.
    fn resolve_record(&self) -> anyhow::Result<ApiKeyRecord> {
        if let Some(secret_value) = self.secret_value.as_deref().filter(|s| !s.is_empty()) {
            output::mask_secret(secret_value);
            return Ok(decode_envelope(secret_value)?);
        }

        match (&self.key_id, &self.issuer_id, &self.base64_private_key) {
            (Some(key_id), Some(issuer_id), Some(private_key)) => Ok(ApiKeyRecord {
                key_id: key_id.clone(),
                issuer_id: issuer_id.clone(),
                private_key: private_key.clone(),
            }),
            _ => Err(ProvisionError::MissingConfiguration(
                "api-key needs --secret-value, or --key-id, --issuer-id and --base64-private-key"
                    .to_string(),
            )
            .into()),
        }
    }
}
