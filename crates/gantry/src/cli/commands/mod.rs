//! CLI commands

mod api_key;
mod certificate;
mod dev_secret;
mod keychain;
mod profile;

pub use api_key::ApiKeyCommand;
pub use certificate::CertificateCommand;
pub use dev_secret::DevSecretCommand;
pub use keychain::KeychainCommand;
pub use profile::ProfileCommand;

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Fail unless running on macOS; keychain and profile provisioning
/// drive Apple-only tooling.
pub(crate) fn require_macos(operation: &str) -> anyhow::Result<()> {
    if cfg!(target_os = "macos") {
        Ok(())
    } else {
        anyhow::bail!("{operation} is only supported on macOS")
    }
}

/// Random password for an ephemeral keychain. Not key material; it only
/// guards a store that lives for one CI run.
pub(crate) fn generate_keychain_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
