//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{
    ApiKeyCommand, CertificateCommand, DevSecretCommand, KeychainCommand, ProfileCommand,
};

/// Gantry - provision macOS code-signing assets for CI runs
#[derive(Debug, Parser)]
#[command(name = "gantry")]
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
    /// Provision a keychain with a developer certificate
    Certificate(CertificateCommand),

    /// Install a provisioning profile
    Profile(ProfileCommand),

    /// Decode or assemble an App Store Connect API key and write it out
    ApiKey(ApiKeyCommand),

    /// Keychain lifecycle operations
    Keychain(KeychainCommand),

    /// Mint a self-signed developer-certificate secret for smoke tests
    DevSecret(DevSecretCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Certificate(ref cmd) => cmd.execute(&self),
            Commands::Profile(ref cmd) => cmd.execute(&self),
            Commands::ApiKey(ref cmd) => cmd.execute(&self),
            Commands::Keychain(ref cmd) => cmd.execute(&self),
            Commands::DevSecret(ref cmd) => cmd.execute(&self),
        }
    }
}
