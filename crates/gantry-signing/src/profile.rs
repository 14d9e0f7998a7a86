//! Provisioning-profile installation

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::info;
use uuid::Uuid;

use crate::error::{ProvisionError, Result};

/// Install a provisioning profile from its base64-encoded secret.
///
/// The decoded bytes are written verbatim under
/// `~/Library/MobileDevice/Provisioning Profiles/` with a generated
/// UUID filename, where Xcode's tooling picks profiles up. Returns the
/// written path.
pub fn install_provisioning_profile(secret_value: &str) -> Result<PathBuf> {
    let decoded = BASE64.decode(secret_value.trim())?;

    let directory = dirs::home_dir()
        .ok_or_else(|| {
            ProvisionError::MissingConfiguration("home directory is not set".to_string())
        })?
        .join("Library/MobileDevice/Provisioning Profiles");
    std::fs::create_dir_all(&directory)?;

    let path = directory.join(format!("{}.mobileprovision", Uuid::new_v4()));
    std::fs::write(&path, decoded)?;

    info!(path = %path.display(), "installed provisioning profile");
    Ok(path)
}
